use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, DiagnosticTest, DiagnosticTestInput, EditorSnapshot};
use crate::components::diagnostic_test_form::DiagnosticTestForm;

#[component]
pub fn DiagnosticTestsPage() -> impl IntoView {
    let (tests, set_tests) = signal::<Option<Vec<DiagnosticTest>>>(None);
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);
    let draft = RwSignal::new(DiagnosticTestInput::default());
    let (editing_id, set_editing_id) = signal::<Option<String>>(None);
    let (pending_delete, set_pending_delete) = signal::<Option<DiagnosticTest>>(None);

    // Every command answers with a fresh reload; a failed reload keeps the
    // list on screen.
    let show = move |result: Result<EditorSnapshot, String>| -> bool {
        match result {
            Ok(snapshot) => {
                if let Some(list) = snapshot.tests {
                    set_tests.set(Some(list));
                }
                let ok = snapshot.error.is_none();
                set_error.set(snapshot.error);
                ok
            }
            Err(e) => {
                set_error.set(Some(e));
                false
            }
        }
    };

    Effect::new(move |_| {
        spawn_local(async move {
            show(commands::load_diagnostic_tests().await);
        });
    });

    let submit = Callback::new(move |()| {
        let input = draft.get();
        let id = editing_id.get();
        set_busy.set(true);
        spawn_local(async move {
            let result = match &id {
                Some(id) => commands::update_diagnostic_test(id, &input).await,
                None => commands::add_diagnostic_test(&input).await,
            };
            if show(result) {
                draft.set(DiagnosticTestInput::default());
                set_editing_id.set(None);
            }
            set_busy.set(false);
        });
    });

    let cancel = Callback::new(move |()| {
        draft.set(DiagnosticTestInput::default());
        set_editing_id.set(None);
    });

    let start_edit = move |test: DiagnosticTest| {
        draft.set(DiagnosticTestInput {
            name: test.name,
            result: test.result,
            date: test.date,
        });
        set_editing_id.set(Some(test.id));
        set_error.set(None);
    };

    let do_delete = move || {
        let Some(test) = pending_delete.get() else { return };
        set_pending_delete.set(None);
        set_busy.set(true);
        spawn_local(async move {
            show(commands::delete_diagnostic_test(&test.id).await);
            if editing_id.get_untracked().as_deref() == Some(test.id.as_str()) {
                cancel.run(());
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="page tests-page">
            <h2>"Diagnostic Tests"</h2>

            <DiagnosticTestForm
                draft=draft
                editing=Signal::derive(move || editing_id.with(|id| id.is_some()))
                busy=busy
                on_submit=submit
                on_cancel=cancel
            />

            {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}

            {move || match tests.get() {
                None => view! { <p class="loading">"Loading tests..."</p> }.into_any(),
                Some(list) if list.is_empty() => {
                    view! { <p class="empty-state">"No diagnostic tests recorded."</p> }.into_any()
                }
                Some(list) => view! {
                    <table class="tests-table">
                        <thead>
                            <tr>
                                <th>"Test"</th>
                                <th>"Result"</th>
                                <th>"Date"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            {list.into_iter().map(|test| {
                                let for_edit = test.clone();
                                let for_delete = test.clone();
                                view! {
                                    <tr>
                                        <td>{test.name}</td>
                                        <td>{test.result}</td>
                                        <td>{test.date}</td>
                                        <td class="row-actions">
                                            <button
                                                class="btn btn-secondary"
                                                on:click=move |_| start_edit(for_edit.clone())
                                            >
                                                "Edit"
                                            </button>
                                            <button
                                                class="btn btn-delete"
                                                on:click=move |_| set_pending_delete.set(Some(for_delete.clone()))
                                            >
                                                "Delete"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }).collect_view()}
                        </tbody>
                    </table>
                }.into_any(),
            }}

            // Delete confirmation modal
            <Show when=move || pending_delete.with(|p| p.is_some())>
                <div class="modal-overlay" on:click=move |_| set_pending_delete.set(None)>
                    <div class="modal-content" on:click=move |ev| ev.stop_propagation()>
                        <h3>"Delete Test?"</h3>
                        <p>
                            "This will permanently delete \""
                            {move || pending_delete.get().map(|t| t.name).unwrap_or_default()}
                            "\". This cannot be undone."
                        </p>
                        <div class="modal-actions">
                            <button class="btn btn-secondary" on:click=move |_| set_pending_delete.set(None)>
                                "Cancel"
                            </button>
                            <button class="btn btn-primary" on:click=move |_| do_delete()>
                                "Delete"
                            </button>
                        </div>
                    </div>
                </div>
            </Show>
        </div>
    }
}
