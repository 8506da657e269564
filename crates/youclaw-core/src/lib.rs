// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the YouClaw assistant runtime.
//!
//! This crate provides the error taxonomy, adapter trait definitions, and
//! the domain types shared by the memory store, scheduler, and router.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::YouclawError;
pub use types::{
    AdapterType, ChannelCapabilities, DeliveryTarget, EmbeddingInput, EmbeddingOutput,
    HealthStatus, InboundMessage, MemorySource, MessageId, OutboundMessage, ProviderRequest,
    ProviderResponse, Role, model_matches,
};

pub use traits::{ChannelAdapter, EmbeddingAdapter, MessageSink, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn youclaw_error_has_all_variants() {
        let _invalid = YouclawError::InvalidInput("empty".into());
        let _not_found = YouclawError::NotFound {
            entity: "memory",
            id: "m-1".into(),
        };
        let _embed = YouclawError::embedding("down");
        let _dims = YouclawError::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        let _inference = YouclawError::inference("refused");
        let _timeout = YouclawError::InferenceTimeout {
            duration: Duration::from_secs(30),
        };
        let _storage = YouclawError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _config = YouclawError::Config("bad".into());
        let _channel = YouclawError::channel("offline");
        let _internal = YouclawError::Internal("bug".into());
    }

    #[test]
    fn transient_classification() {
        assert!(YouclawError::embedding("x").is_transient());
        assert!(YouclawError::inference("x").is_transient());
        assert!(!YouclawError::InvalidInput("x".into()).is_transient());
        assert!(
            !YouclawError::InferenceTimeout {
                duration: Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(
            !YouclawError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
            .is_transient()
        );
    }

    #[test]
    fn user_message_hides_internal_detail() {
        let err = YouclawError::Storage {
            source: Box::new(std::io::Error::other("disk /var/secret full")),
        };
        assert!(!err.user_message().contains("secret"));

        let timeout = YouclawError::InferenceTimeout {
            duration: Duration::from_secs(5),
        };
        assert!(timeout.user_message().contains("too long"));
    }

    #[test]
    fn memory_source_storage_strings() {
        for source in [
            MemorySource::Conversation,
            MemorySource::ScheduledTask,
            MemorySource::Manual,
        ] {
            assert_eq!(MemorySource::from_str_value(source.as_str()), source);
            assert_eq!(source.to_string(), source.as_str());
            assert_eq!(MemorySource::from_str(source.as_str()).unwrap(), source);
        }
        assert_eq!(MemorySource::from_str_value("bogus"), MemorySource::Manual);
    }

    #[test]
    fn role_storage_strings() {
        assert_eq!(Role::from_str_value("user"), Some(Role::User));
        assert_eq!(Role::from_str_value("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_str_value("system"), None);
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn model_names_match_their_latest_tag() {
        assert!(model_matches("all-minilm:latest", "all-minilm"));
        assert!(model_matches("qwen2.5:1.5b-instruct", "qwen2.5:1.5b-instruct"));
        assert!(!model_matches("qwen2.5:7b", "qwen2.5:1.5b-instruct"));
        assert!(!model_matches("llama3:8b", "llama3"));
    }

    #[test]
    fn delivery_target_display() {
        let target = DeliveryTarget {
            platform: "telegram".into(),
            channel: "12345".into(),
        };
        assert_eq!(target.to_string(), "telegram:12345");
    }

    #[test]
    fn memory_source_serializes_snake_case() {
        let json = serde_json::to_string(&MemorySource::ScheduledTask).unwrap();
        assert_eq!(json, "\"scheduled_task\"");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_message_sink<T: MessageSink>() {}
    }
}
