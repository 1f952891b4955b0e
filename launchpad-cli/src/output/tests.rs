//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use launchpad_core::{Analysis, Notification, Question, Startup, keys};
    use launchpad_store::{ClientConfig, EntryInfo};
    use serde_json::json;

    fn startup(id: &str, name: &str) -> Startup {
        serde_json::from_value(json!({"id": id, "name": name, "industry": "fintech"})).unwrap()
    }

    #[test]
    fn test_format_startups_table() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_startups(&[startup("s1", "Acme"), startup("s2", "Globex")]);

        assert!(output.contains("Name"));
        assert!(output.contains("Acme"));
        assert!(output.contains("Globex"));
        assert!(output.contains("fintech"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_format_startups_empty() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_startups(&[]), "No startups yet");
    }

    #[test]
    fn test_format_startup_detail() {
        let formatter = TextFormatter::new(false);
        let mut s = startup("s1", "Acme");
        s.description = Some("Rockets for everyone".into());

        let output = formatter.format_startup(&s);
        assert!(output.starts_with("Acme (s1)"));
        assert!(output.contains("Rockets for everyone"));
        assert!(output.contains("Industry: fintech"));
        assert!(!output.contains("Stage"));
    }

    #[test]
    fn test_format_analyses() {
        let formatter = TextFormatter::new(false);
        let analyses: Vec<Analysis> = serde_json::from_value(json!([
            {"id": "a1", "startup_id": "s1", "status": "completed", "score": 7.25, "summary": "Strong team"},
            {"id": "a2", "startup_id": "s1", "status": "running"}
        ]))
        .unwrap();

        let output = formatter.format_analyses(&analyses);
        assert!(output.contains("completed"));
        assert!(output.contains("7.2") || output.contains("7.3"));
        assert!(output.contains("Strong team"));
        assert!(output.contains("running"));
    }

    #[test]
    fn test_format_questions_unanswered_first() {
        let formatter = TextFormatter::new(false);
        let questions: Vec<Question> = serde_json::from_value(json!([
            {"id": "q1", "startup_id": "s1", "text": "Revenue?", "answer": "None yet"},
            {"id": "q2", "startup_id": "s1", "text": "Team size?"}
        ]))
        .unwrap();

        let output = formatter.format_questions(&questions);
        let first = output.lines().next().unwrap();
        assert!(first.starts_with('?'));
        assert!(first.contains("Team size?"));
        assert!(output.contains("None yet"));
    }

    #[test]
    fn test_format_notifications_marks_unread() {
        let formatter = TextFormatter::new(false);
        let notifications: Vec<Notification> = serde_json::from_value(json!([
            {"id": "n1", "title": "Analysis done", "message": "Score 8", "read": false},
            {"id": "n2", "title": "Welcome", "read": true}
        ]))
        .unwrap();

        let output = formatter.format_notifications(&notifications);
        assert!(output.contains("● [n1] Analysis done"));
        assert!(output.contains("· [n2] Welcome"));
        assert!(output.contains("Score 8"));
    }

    #[test]
    fn test_format_entries() {
        let formatter = TextFormatter::new(false);
        let entries = vec![
            EntryInfo {
                key: keys::unread_count(),
                fetched_at: Some(chrono::Utc::now()),
                stale: false,
                fetching: false,
                subscriber_count: 1,
                has_data: true,
            },
            EntryInfo {
                key: keys::startups(),
                fetched_at: None,
                stale: true,
                fetching: false,
                subscriber_count: 0,
                has_data: false,
            },
        ];

        let output = formatter.format_entries(&entries);
        let lines: Vec<_> = output.lines().collect();
        assert!(lines[0].contains("fresh"));
        assert!(lines[0].contains("(1 subscribers)"));
        assert!(lines[1].contains("stale"));
        assert!(lines[1].contains("never"));
    }

    #[test]
    fn test_format_config_defaults() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_config(&ClientConfig::default());

        assert!(output.contains("http://localhost:8000/api"));
        assert!(output.contains("on every 30000ms"));
        assert!(output.contains("unbounded"));
        assert!(output.contains("$LAUNCHPAD_TOKEN, then keychain"));
    }

    #[test]
    fn test_format_error() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_error("unread count", "connection refused");
        assert_eq!(output, "unread count: Error - connection refused");
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use launchpad_core::{Startup, keys};
    use launchpad_store::EntryInfo;
    use serde_json::{Value, json};

    #[test]
    fn test_format_pretty_json() {
        let formatter = JsonFormatter::new(true);

        let data = json!({"key": "value"});
        let output = formatter.format(&data).unwrap();

        assert!(output.contains('\n'));
        assert!(output.contains("  "));
    }

    #[test]
    fn test_models_keep_unknown_fields() {
        let formatter = JsonFormatter::new(false);
        let startup: Startup =
            serde_json::from_value(json!({"id": "s1", "name": "Acme", "founders": 2})).unwrap();

        let output: Value = serde_json::from_str(&formatter.format(&[startup]).unwrap()).unwrap();
        assert_eq!(output[0]["founders"], 2);
        assert_eq!(output[0]["name"], "Acme");
    }

    #[test]
    fn test_format_entries() {
        let formatter = JsonFormatter::new(false);
        let entries = vec![EntryInfo {
            key: keys::analyses("s1"),
            fetched_at: None,
            stale: true,
            fetching: true,
            subscriber_count: 0,
            has_data: false,
        }];

        let output: Value = serde_json::from_str(&formatter.format_entries(&entries).unwrap()).unwrap();
        assert_eq!(output[0]["key"], keys::analyses("s1").to_string());
        assert_eq!(output[0]["stale"], true);
        assert_eq!(output[0]["hasData"], false);
        assert!(output[0].get("fetchedAt").is_none());
    }
}
