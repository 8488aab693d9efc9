pub mod alert_card;
pub mod api_key_form;
pub mod diagnostic_test_form;
pub mod navbar;
pub mod status_badge;
