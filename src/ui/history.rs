//! History page: filtered, paginated past turns plus aggregate analysis

use crate::app::AppState;
use crate::storage::database::{ChatRecord, HistoryFilter, HistorySummary};
use crate::ui::components::tabs::TabButton;
use dioxus::prelude::*;

/// Records shown per page
pub const PAGE_SIZE: usize = 5;

/// Number of pages needed for `total` records; at least one
fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

fn filter_from_label(label: &str) -> HistoryFilter {
    HistoryFilter::ALL
        .into_iter()
        .find(|filter| filter.label() == label)
        .unwrap_or_default()
}

#[derive(PartialEq, Clone, Copy)]
enum HistoryTab {
    Records,
    Analysis,
}

#[component]
pub fn HistoryPage() -> Element {
    let mut active_tab = use_signal(|| HistoryTab::Records);

    rsx! {
        h2 { "History" }
        div {
            class: "tabs",
            TabButton {
                active: active_tab() == HistoryTab::Records,
                onclick: move |_| active_tab.set(HistoryTab::Records),
                label: "Records",
            }
            TabButton {
                active: active_tab() == HistoryTab::Analysis,
                onclick: move |_| active_tab.set(HistoryTab::Analysis),
                label: "Analysis",
            }
        }
        match active_tab() {
            HistoryTab::Records => rsx! { RecordList {} },
            HistoryTab::Analysis => rsx! { Analysis {} },
        }
    }
}

#[component]
fn RecordList() -> Element {
    let app_state = use_context::<AppState>();
    let mut filter = use_signal(HistoryFilter::default);
    let mut page = use_signal(|| 0usize);

    // Subscribe to store writes
    let _version = (app_state.history_version)();

    let store = &app_state.store;
    let listing = store.count(filter()).and_then(|total| {
        let pages = page_count(total);
        let current = page().min(pages - 1);
        store
            .query_history(filter(), PAGE_SIZE, current * PAGE_SIZE)
            .map(|records| (total, pages, current, records))
    });

    let (total, pages, current, records) = match listing {
        Ok(listing) => listing,
        Err(e) => {
            tracing::error!("Failed to read chat history: {}", e);
            return rsx! {
                div { class: "notice notice-error", span { "Failed to read chat history: {e}" } }
            };
        }
    };
    let filter_label = filter().label();

    rsx! {
        div {
            class: "row",
            label { "Filter" }
            select {
                class: "field",
                style: "width: auto; color-scheme: dark;",
                value: "{filter_label}",
                onchange: move |evt| {
                    filter.set(filter_from_label(&evt.value()));
                    page.set(0);
                },
                for choice in HistoryFilter::ALL {
                    option {
                        value: "{choice.label()}",
                        selected: choice.label() == filter_label,
                        "{choice.label()}"
                    }
                }
            }
            span { class: "muted", "{total} records" }
        }

        if records.is_empty() {
            div { class: "panel muted", "No records yet." }
        }

        for record in records {
            RecordCard { key: "{record.id}", record: record.clone() }
        }

        div {
            class: "row",
            button {
                class: "btn",
                disabled: current == 0,
                onclick: move |_| page.set(current.saturating_sub(1)),
                "Previous"
            }
            span { class: "muted", "Page {current + 1} of {pages}" }
            button {
                class: "btn",
                disabled: current + 1 >= pages,
                onclick: move |_| page.set(current + 1),
                "Next"
            }
        }
    }
}

#[component]
fn RecordCard(record: ChatRecord) -> Element {
    let question_preview: String = record.question.chars().take(60).collect();

    rsx! {
        details {
            class: "panel record",
            summary {
                span { class: "mono muted", "#{record.id} {record.timestamp} " }
                "{question_preview}"
            }
            dl {
                dt { "Model" }
                dd { class: "mono", "{record.model}" }
                dt { "Question" }
                dd { "{record.question}" }
                dt { "Answer" }
                dd { "{record.answer}" }
                dt { "Feedback" }
                dd { "{record.feedback}" }
                if !record.correct_answer.is_empty() {
                    dt { "Correct answer" }
                    dd { "{record.correct_answer}" }
                }
                dt { "Response time" }
                dd { "{record.response_time:.2}s" }
                dt { "Scores" }
                dd {
                    class: "mono",
                    "BLEU {record.bleu_score:.3} · similarity {record.similarity_score:.3} · relevance {record.relevance_score:.3} · {record.word_count} words"
                }
            }
        }
    }
}

#[component]
fn Analysis() -> Element {
    let app_state = use_context::<AppState>();
    let _version = (app_state.history_version)();

    let summary: HistorySummary = match app_state.store.summary() {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Failed to summarize chat history: {}", e);
            return rsx! {
                div { class: "notice notice-error", span { "Failed to summarize chat history: {e}" } }
            };
        }
    };

    if summary.total == 0 {
        return rsx! { div { class: "panel muted", "No records to analyze." } };
    }

    let accuracy = summary.accuracy() * 100.0;

    rsx! {
        div {
            class: "stats",
            Stat { label: "Total", value: summary.total.to_string() }
            Stat { label: "Correct", value: summary.correct.to_string() }
            Stat { label: "Partially correct", value: summary.partially_correct.to_string() }
            Stat { label: "Incorrect", value: summary.incorrect.to_string() }
            Stat { label: "Accuracy", value: format!("{accuracy:.1}%") }
            Stat { label: "Avg response time", value: format!("{:.2}s", summary.avg_response_time) }
            Stat { label: "Avg BLEU", value: format!("{:.3}", summary.avg_bleu) }
            Stat { label: "Avg similarity", value: format!("{:.3}", summary.avg_similarity) }
            Stat { label: "Avg relevance", value: format!("{:.3}", summary.avg_relevance) }
            Stat { label: "Avg word count", value: format!("{:.1}", summary.avg_word_count) }
        }
    }
}

#[component]
fn Stat(label: String, value: String) -> Element {
    rsx! {
        div {
            class: "stat",
            div { class: "muted", "{label}" }
            div { class: "value", "{value}" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Feedback;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(5), 1);
        assert_eq!(page_count(6), 2);
        assert_eq!(page_count(11), 3);
    }

    #[test]
    fn test_filter_from_label() {
        assert_eq!(filter_from_label("All"), HistoryFilter::All);
        assert_eq!(
            filter_from_label(Feedback::Incorrect.label()),
            HistoryFilter::Rated(Feedback::Incorrect)
        );
        assert_eq!(filter_from_label("bogus"), HistoryFilter::All);
    }
}
