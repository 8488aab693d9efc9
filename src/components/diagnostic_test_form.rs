use leptos::prelude::*;

use crate::commands::DiagnosticTestInput;

/// Add/edit form. The parent owns `draft` so it can pre-fill it for editing
/// and clear it after a successful save.
#[component]
pub fn DiagnosticTestForm(
    draft: RwSignal<DiagnosticTestInput>,
    #[prop(into)] editing: Signal<bool>,
    #[prop(into)] busy: Signal<bool>,
    on_submit: Callback<()>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    view! {
        <div class="test-form">
            <h3>{move || if editing.get() { "Edit Test" } else { "Add Test" }}</h3>
            <div class="form-group">
                <label for="test-name">"Test Name"</label>
                <input
                    id="test-name"
                    type="text"
                    class="input"
                    placeholder="CBC"
                    prop:value=move || draft.with(|d| d.name.clone())
                    on:input=move |ev| draft.update(|d| d.name = event_target_value(&ev))
                />
            </div>
            <div class="form-group">
                <label for="test-result">"Result"</label>
                <input
                    id="test-result"
                    type="text"
                    class="input"
                    placeholder="Normal"
                    prop:value=move || draft.with(|d| d.result.clone())
                    on:input=move |ev| draft.update(|d| d.result = event_target_value(&ev))
                />
            </div>
            <div class="form-group">
                <label for="test-date">"Date"</label>
                <input
                    id="test-date"
                    type="date"
                    class="input"
                    prop:value=move || draft.with(|d| d.date.clone())
                    on:input=move |ev| draft.update(|d| d.date = event_target_value(&ev))
                />
            </div>
            <div class="input-row">
                <button
                    class="btn btn-primary"
                    on:click=move |_| on_submit.run(())
                    disabled=move || busy.get()
                >
                    {move || if editing.get() { "Update" } else { "Add" }}
                </button>
                <Show when=move || editing.get()>
                    <button class="btn btn-secondary" on:click=move |_| on_cancel.run(())>
                        "Cancel"
                    </button>
                </Show>
            </div>
        </div>
    }
}
