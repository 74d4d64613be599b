#[cfg(test)]
mod tests {

    mod slug_tests {
        use crate::services::slug::{
            generate_slug, is_reserved, post_slug, transliterate, validate_slug, SlugClock,
        };

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Hello World"), "hello-world");
        }

        #[test]
        fn test_generate_slug_special_characters() {
            assert_eq!(generate_slug("Hello, World!"), "hello-world");
        }

        #[test]
        fn test_generate_slug_multiple_spaces() {
            assert_eq!(generate_slug("  Hello   World  "), "hello-world");
        }

        #[test]
        fn test_generate_slug_cyrillic() {
            assert_eq!(generate_slug("Привет мир"), "privet-mir");
        }

        #[test]
        fn test_generate_slug_mixed_scripts() {
            assert_eq!(generate_slug("Rust и Python"), "rust-i-python");
        }

        #[test]
        fn test_validate_slug() {
            assert!(validate_slug("hello-world"));
            assert!(validate_slug("post-1700000000"));
            assert!(!validate_slug(""));
            assert!(!validate_slug("Hello-World"));
            assert!(validate_slug("hello_world"));
            assert!(!validate_slug("hello world"));
            assert!(!validate_slug("hello.world"));
            assert!(!validate_slug(&"a".repeat(201)));
        }

        #[test]
        fn test_reserved_slug_any_case() {
            assert!(is_reserved("create"));
            assert!(is_reserved("CREATE"));
            assert!(is_reserved(" Create "));
            assert!(!is_reserved("created"));
        }

        #[test]
        fn test_transliterate_without_cyrillic() {
            assert_eq!(transliterate("plain ascii"), None);
        }

        #[test]
        fn test_transliterate_multi_letter_sounds() {
            assert_eq!(transliterate("щука").as_deref(), Some("schuka"));
            assert_eq!(transliterate("Юля").as_deref(), Some("Julja"));
            assert_eq!(transliterate("цех").as_deref(), Some("tseh"));
        }

        #[test]
        fn test_transliterate_drops_signs() {
            assert_eq!(transliterate("съезд").as_deref(), Some("sezd"));
            assert_eq!(transliterate("соль").as_deref(), Some("sol"));
        }

        #[test]
        fn test_post_slug_unique_for_same_title() {
            let clock = SlugClock::new();
            let first = post_slug("Same Title", &clock);
            let second = post_slug("Same Title", &clock);
            assert_ne!(first, second);
            assert!(first.starts_with("same-title-"));
            assert!(second.starts_with("same-title-"));
        }

        #[test]
        fn test_post_slug_without_slugifiable_title() {
            let clock = SlugClock::new();
            let slug = post_slug("!!!", &clock);
            assert!(slug.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn test_post_slug_is_valid() {
            let clock = SlugClock::new();
            assert!(validate_slug(&post_slug("Заметки о Rust", &clock)));
        }
    }

    mod pagination_tests {
        use crate::services::pagination::{paginate, PageWindow};

        #[test]
        fn test_window_first_page() {
            let window = PageWindow::new(20, 1, 8);
            assert_eq!(window.num_pages, 3);
            assert_eq!(window.offset(), 0);
            assert!(window.has_next());
            assert!(!window.has_previous());
        }

        #[test]
        fn test_window_beyond_last_clamps() {
            let window = PageWindow::new(20, 99, 8);
            assert_eq!(window.number, 3);
            assert_eq!(window.offset(), 16);
            assert!(!window.has_next());
        }

        #[test]
        fn test_window_page_zero_is_first() {
            assert_eq!(PageWindow::new(20, 0, 8).number, 1);
        }

        #[test]
        fn test_window_empty_collection_has_one_page() {
            let window = PageWindow::new(0, 5, 8);
            assert_eq!(window.num_pages, 1);
            assert_eq!(window.number, 1);
            assert!(!window.has_next());
            assert!(!window.has_previous());
        }

        #[test]
        fn test_window_exact_multiple() {
            assert_eq!(PageWindow::new(16, 1, 8).num_pages, 2);
        }

        #[test]
        fn test_window_zero_page_size() {
            let window = PageWindow::new(3, 2, 0);
            assert_eq!(window.per_page, 1);
            assert_eq!(window.num_pages, 3);
        }

        #[test]
        fn test_paginate_last_partial_page() {
            let page = paginate((1..=10).collect::<Vec<_>>(), 42, 3);
            assert_eq!(page.number, 4);
            assert_eq!(page.items, vec![10]);
            assert!(page.has_previous);
        }

        #[test]
        fn test_page_map_keeps_position() {
            let page = paginate(vec![1, 2, 3, 4], 2, 2).map(|n| n * 10);
            assert_eq!(page.items, vec![30, 40]);
            assert_eq!(page.number, 2);
            assert_eq!(page.num_pages, 2);
        }
    }

    mod validation_tests {
        use crate::services::validation::{
            is_valid_email, required, FormErrors, ServiceError, NON_FIELD,
        };

        #[test]
        fn test_required_blank() {
            let mut errors = FormErrors::new();
            required(&mut errors, "title", "   ", Some(10));
            assert_eq!(errors.get("title"), Some(&["This field is required.".to_string()][..]));
        }

        #[test]
        fn test_required_too_long() {
            let mut errors = FormErrors::new();
            required(&mut errors, "title", "abcdef", Some(5));
            assert_eq!(
                errors.get("title"),
                Some(&["Ensure this value has at most 5 characters (it has 6).".to_string()][..])
            );
        }

        #[test]
        fn test_required_counts_characters() {
            let mut errors = FormErrors::new();
            required(&mut errors, "title", "привет", Some(6));
            assert!(errors.is_empty());
        }

        #[test]
        fn test_form_errors_into_result() {
            assert!(FormErrors::new().into_result().is_ok());
            let errors = FormErrors::single(NON_FIELD, "broken");
            assert!(errors.has(NON_FIELD));
            assert!(errors.into_result().is_err());
        }

        #[test]
        fn test_form_errors_serialize_as_map() {
            let mut errors = FormErrors::new();
            errors.add("slug", "Enter correct slug");
            errors.add("slug", "Slug create already exists");
            let value = serde_json::to_value(&errors).unwrap();
            assert_eq!(
                value,
                serde_json::json!({"slug": ["Enter correct slug", "Slug create already exists"]})
            );
        }

        #[test]
        fn test_service_error_form_errors() {
            let err = ServiceError::invalid("email", "User not found!");
            assert!(err.form_errors().unwrap().has("email"));
            assert!(ServiceError::Forbidden.form_errors().is_none());
        }

        #[test]
        fn test_email_validation() {
            assert!(is_valid_email("user@example.com"));
            assert!(!is_valid_email("user@"));
            assert!(!is_valid_email("user@example"));
            assert!(!is_valid_email("us er@example.com"));
            assert!(!is_valid_email("a@b@example.com"));
        }
    }

    mod auth_tests {
        use crate::services::auth::{generate_password, hash_password, validate_password, verify_password};

        #[test]
        fn test_password_rules() {
            assert!(validate_password("Password123").is_ok());
            assert!(validate_password("Pass1").is_err());
            assert!(validate_password("password123").is_err());
            assert!(validate_password("PASSWORD123").is_err());
            assert!(validate_password("Passwordabc").is_err());
        }

        #[test]
        fn test_hash_and_verify() {
            let hash = hash_password("Password123").unwrap();
            assert!(verify_password("Password123", &hash));
            assert!(!verify_password("Password124", &hash));
        }

        #[test]
        fn test_verify_against_garbage_hash() {
            assert!(!verify_password("Password123", "not-a-hash"));
        }

        #[test]
        fn test_generated_passwords_are_compliant() {
            for _ in 0..50 {
                let password = generate_password();
                assert_eq!(password.len(), 12);
                assert!(validate_password(&password).is_ok(), "{}", password);
            }
        }
    }

    mod user_role_tests {
        use crate::models::UserRole;

        #[test]
        fn test_role_round_trip_text() {
            for role in [UserRole::Admin, UserRole::Author, UserRole::Reader] {
                assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
            }
            assert_eq!("ADMIN".parse::<UserRole>(), Ok(UserRole::Admin));
            assert!("editor".parse::<UserRole>().is_err());
        }

        #[test]
        fn test_role_permissions() {
            assert!(UserRole::Admin.can_publish());
            assert!(UserRole::Author.can_publish());
            assert!(!UserRole::Reader.can_publish());
            assert_eq!(UserRole::default(), UserRole::Reader);
        }
    }

    mod display_tests {
        use crate::models::{AuthorSummary, Comment, Feedback, Reply};

        fn author(name: &str) -> AuthorSummary {
            AuthorSummary {
                id: 1,
                username: name.to_lowercase(),
                full_name: name.to_string(),
            }
        }

        #[test]
        fn test_comment_display() {
            let comment = Comment {
                id: 1,
                post_id: 1,
                text: "Nice post".to_string(),
                date: "2024-01-05 10:00:00".to_string(),
                author: author("Alice"),
            };
            assert_eq!(comment.to_string(), "[Alice]: Nice post");
        }

        #[test]
        fn test_reply_display() {
            let reply = Reply {
                id: 1,
                comment_id: 1,
                text: "Thanks".to_string(),
                date: "2024-01-05 10:00:00".to_string(),
                author: author("Bob"),
                addressee: author("Alice"),
            };
            assert_eq!(reply.to_string(), "[Bob] to [Alice]: \"Thanks\"");
        }

        #[test]
        fn test_feedback_display() {
            let feedback = Feedback {
                id: 1,
                name: "Carol".to_string(),
                email: "carol@example.com".to_string(),
                message: "Hi".to_string(),
                date: "2024-01-05 10:00:00".to_string(),
            };
            assert_eq!(feedback.to_string(), "Carol | (carol@example.com)");
        }

        #[test]
        fn test_display_date() {
            use crate::services::posts::display_date;
            assert_eq!(display_date("2024-01-05 10:00:00"), "Jan. 05, 2024");
            assert_eq!(display_date("garbage"), "garbage");
        }
    }

    mod config_tests {
        use crate::config::{parse_lifetime_days, Config};
        use std::path::Path;

        #[test]
        fn test_default_config_is_valid() {
            let config = Config::default();
            assert!(config.validate().is_ok());
            assert_eq!(config.content.posts_per_page, 8);
            assert_eq!(config.content.account_posts_per_page, 3);
            assert_eq!(config.content.pinned_limit, 3);
        }

        #[test]
        fn test_session_lifetime_parsing() {
            assert_eq!(parse_lifetime_days("7d").unwrap(), 7);
            assert_eq!(parse_lifetime_days("2w").unwrap(), 14);
            assert!(parse_lifetime_days("0d").is_err());
            assert!(parse_lifetime_days("7h").is_err());
            assert!(parse_lifetime_days("d").is_err());
            assert!(parse_lifetime_days("7д").is_err());
        }

        #[test]
        fn test_validate_rejects_zero_page_size() {
            let mut config = Config::default();
            config.content.posts_per_page = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_validate_rejects_bad_lifetime() {
            let mut config = Config::default();
            config.auth.session_lifetime = "forever".to_string();
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_config_load_missing_file() {
            assert!(Config::load(Path::new("/nonexistent/blog.toml")).is_err());
        }

        #[test]
        fn test_config_load_partial_toml() {
            let config_path = std::env::temp_dir().join("test_blog_engine_config.toml");
            std::fs::write(
                &config_path,
                r#"
[site]
title = "Test Blog"

[content]
posts_per_page = 5

[auth]
session_lifetime = "2w"
"#,
            )
            .unwrap();

            let config = Config::load(&config_path).unwrap();
            assert_eq!(config.site.title, "Test Blog");
            assert_eq!(config.content.posts_per_page, 5);
            assert_eq!(config.content.account_posts_per_page, 3);
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.auth.session_days().unwrap(), 14);

            std::fs::remove_file(&config_path).ok();
        }
    }
}
