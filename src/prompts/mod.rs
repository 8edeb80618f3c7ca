//! 各步骤使用的Prompt模板

use crate::research::state::{Message, Role};

const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

/// 当前日期，如 "October 18, 2026"
pub fn current_date() -> String {
    chrono::Local::now().format("%B %d, %Y").to_string()
}

/// 从对话中提取调研主题：单条消息直接使用其内容，多条消息按角色逐行展开
pub fn research_topic(conversation: &[Message]) -> String {
    if let [only] = conversation {
        return only.content.clone();
    }

    conversation
        .iter()
        .map(|message| match message.role {
            Role::User => format!("User: {}", message.content),
            Role::Assistant => format!("Assistant: {}", message.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn query_writer(topic: &str, number_queries: usize) -> String {
    format!(
        include_str!("query_writer.tpl"),
        number_queries,
        current_date(),
        topic
    )
}

pub fn web_searcher(query: &str) -> String {
    format!(include_str!("web_searcher.tpl"), query, current_date(), query)
}

pub fn reflection(topic: &str, summaries: &[String]) -> String {
    format!(
        include_str!("reflection.tpl"),
        topic,
        summaries.join(SUMMARY_SEPARATOR)
    )
}

pub fn answer(topic: &str, summaries: &[String]) -> String {
    format!(
        include_str!("answer.tpl"),
        current_date(),
        topic,
        summaries.join(SUMMARY_SEPARATOR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_topic_single_message() {
        let conversation = vec![Message::user("What is the capital of France?")];
        assert_eq!(research_topic(&conversation), "What is the capital of France?");
    }

    #[test]
    fn test_research_topic_multiple_messages() {
        let conversation = vec![
            Message::user("Tell me about Rust"),
            Message::assistant("Rust is a systems language."),
            Message::user("Who maintains it?"),
        ];
        assert_eq!(
            research_topic(&conversation),
            "User: Tell me about Rust\nAssistant: Rust is a systems language.\nUser: Who maintains it?"
        );
    }

    #[test]
    fn test_templates_embed_arguments() {
        let prompt = query_writer("rust async runtimes", 4);
        assert!(prompt.contains("Don't produce more than 4 queries"));
        assert!(prompt.contains("rust async runtimes"));

        let prompt = reflection("topic", &["first".to_string(), "second".to_string()]);
        assert!(prompt.contains("first\n\n---\n\nsecond"));

        assert!(web_searcher("tokio vs smol").contains("\"tokio vs smol\""));
    }
}
