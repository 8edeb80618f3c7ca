#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_args_default_values() {
        let args =
            Args::try_parse_from(["pro-search-rs", "What is the capital of France?"]).unwrap();

        assert_eq!(args.question, "What is the capital of France?");
        assert_eq!(args.initial_queries, None);
        assert_eq!(args.max_loops, None);
        assert_eq!(args.reasoning_model, None);
        assert_eq!(args.config, None);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_require_question() {
        assert!(Args::try_parse_from(["pro-search-rs"]).is_err());
    }

    #[test]
    fn test_args_long_options() {
        let args = Args::try_parse_from([
            "pro-search-rs",
            "Who won the 2022 world cup?",
            "--initial-queries",
            "5",
            "--max-loops",
            "1",
            "--reasoning-model",
            "gemini-2.5-pro",
            "--provider",
            "openai",
            "--api-key",
            "test-key",
            "--timeout-seconds",
            "30",
            "--max-parallels",
            "2",
            "-c",
            "/config.toml",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.initial_queries, Some(5));
        assert_eq!(args.max_loops, Some(1));
        assert_eq!(args.reasoning_model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(args.provider.as_deref(), Some("openai"));
        assert_eq!(args.api_key.as_deref(), Some("test-key"));
        assert_eq!(args.timeout_seconds, Some(30));
        assert_eq!(args.max_parallels, Some(2));
        assert_eq!(args.config, Some(PathBuf::from("/config.toml")));
        assert!(args.verbose);
    }

    #[test]
    fn test_build_config_defaults() {
        let args = Args::try_parse_from(["pro-search-rs", "question"]).unwrap();
        let config = args.build_config(no_env).unwrap();

        assert_eq!(config.llm.provider, LLMProvider::Gemini);
        assert_eq!(config.research.number_of_initial_queries, 3);
        assert_eq!(config.research.max_research_loops, 2);
        assert!(!config.verbose);
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\napi_key = \"file-key\"\nmax_parallels = 4\n\n[research]\nmax_research_loops = 5\nnumber_of_initial_queries = 2"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::try_parse_from([
            "pro-search-rs",
            "question",
            "--config",
            path.as_str(),
            "--max-loops",
            "1",
            "--provider",
            "openai",
        ])
        .unwrap();

        let config = args
            .build_config(|name| match name {
                "MAX_RESEARCH_LOOPS" => Some("3".to_string()),
                "NUMBER_OF_INITIAL_QUERIES" => Some("6".to_string()),
                "GEMINI_API_KEY" => Some("env-key".to_string()),
                _ => None,
            })
            .unwrap();

        // 命令行 > 环境变量 > 配置文件
        assert_eq!(config.research.max_research_loops, 1);
        assert_eq!(config.research.number_of_initial_queries, 6);
        assert_eq!(config.llm.api_key, "file-key");
        assert_eq!(config.llm.max_parallels, 4);
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_openai_provider_keeps_gemini_key_for_search() {
        let args = Args::try_parse_from([
            "pro-search-rs",
            "question",
            "--provider",
            "openai",
            "--api-key",
            "sk-openai",
        ])
        .unwrap();

        let config = args
            .build_config(|name| match name {
                "GEMINI_API_KEY" => Some("gemini-key".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.llm.generation_base_url(), "https://api.openai.com/v1");
        assert_eq!(config.llm.generation_api_key(), "sk-openai");
        assert_eq!(config.llm.search_key(), "gemini-key");
    }

    #[test]
    fn test_search_key_and_base_url_flags() {
        let args = Args::try_parse_from([
            "pro-search-rs",
            "question",
            "--api-base-url",
            "http://localhost:8080/v1",
            "--search-api-key",
            "flag-key",
        ])
        .unwrap();

        let config = args.build_config(no_env).unwrap();
        assert_eq!(config.llm.generation_base_url(), "http://localhost:8080/v1");
        assert_eq!(config.llm.search_key(), "flag-key");
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let args = Args::try_parse_from([
            "pro-search-rs",
            "question",
            "--config",
            "/nonexistent/pro-search.toml",
        ])
        .unwrap();

        assert!(args.build_config(no_env).is_err());
    }

    #[test]
    fn test_unknown_provider_fails() {
        let args =
            Args::try_parse_from(["pro-search-rs", "question", "--provider", "mistral"]).unwrap();

        assert!(args.build_config(no_env).is_err());
    }

    #[test]
    fn test_research_request() {
        let args = Args::try_parse_from([
            "pro-search-rs",
            "question",
            "--reasoning-model",
            "gemini-2.5-pro",
        ])
        .unwrap();

        let request = args.research_request();
        assert_eq!(request.question, "question");
        assert_eq!(request.reasoning_model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(request.initial_query_count, None);
        assert_eq!(request.max_loops, None);
    }
}
