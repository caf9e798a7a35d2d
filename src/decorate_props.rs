//! Property tests for module decoration and the rewrite toggle.

#[cfg(test)]
mod property_tests {
    use crate::decorate::{decorate_module, DecorationMode, LOCALE_KEY_ENTRY};
    use crate::exports::{parse_exports, ExportMapping, PatternLocator};
    use crate::resolve::{ResolutionDecision, ResolutionPass};
    use proptest::prelude::*;
    use serde_json::Value;
    use std::fs;
    use std::path::Path;

    /// Class names as a CSS Modules transform emits them; never with a
    /// leading space.
    fn class_name() -> impl Strategy<Value = String> {
        "[_a-zA-Z][_a-zA-Z0-9-]{0,12}"
    }

    fn export_mapping() -> impl Strategy<Value = ExportMapping> {
        prop::collection::vec((class_name(), "[_a-zA-Z0-9-]{1,10}"), 0..12).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        })
    }

    fn module_text(mapping: &ExportMapping) -> String {
        format!(
            "exports.push([module.id, \".x{{}}\", \"\"]);\nexports.locals = {};",
            Value::Object(mapping.clone())
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Classes mode keeps the mapping and key recoverable from the output.
        #[test]
        fn prop_classes_mode_recovers_mapping_and_key(
            mapping in export_mapping(),
            key in "[a-zA-Z][a-zA-Z0-9_.-]{0,16}",
        ) {
            let path = format!("/app/src/{}.css", key);
            let out = decorate_module(
                &PatternLocator,
                &module_text(&mapping),
                Path::new(&path),
                DecorationMode::Classes,
            )
            .unwrap();

            let decorated = parse_exports(&PatternLocator, &out).unwrap().unwrap().mapping;
            let default = decorated["default"].as_object().unwrap();
            prop_assert_eq!(default.len(), 2);
            prop_assert_eq!(&default["classes"], &Value::Object(mapping));
            prop_assert_eq!(&default["key"], &Value::String(key));
        }

        /// Locale-key mode keeps every original entry and adds exactly one.
        #[test]
        fn prop_locale_key_mode_adds_one_entry(
            mapping in export_mapping(),
            key in "[a-zA-Z][a-zA-Z0-9_.-]{0,16}",
        ) {
            let path = format!("/app/src/{}.css", key);
            let out = decorate_module(
                &PatternLocator,
                &module_text(&mapping),
                Path::new(&path),
                DecorationMode::LocaleKey,
            )
            .unwrap();

            let decorated = parse_exports(&PatternLocator, &out).unwrap().unwrap().mapping;
            let default = decorated["default"].as_object().unwrap();
            prop_assert_eq!(default.len(), mapping.len() + 1);
            for (name, value) in &mapping {
                prop_assert_eq!(&default[name], value);
            }
            prop_assert_eq!(&default[LOCALE_KEY_ENTRY], &Value::String(key));
        }

        /// Text around the literal survives decoration byte for byte.
        #[test]
        fn prop_decoration_only_touches_the_literal(mapping in export_mapping()) {
            let text = module_text(&mapping);
            let out = decorate_module(
                &PatternLocator,
                &text,
                Path::new("/app/src/card.css"),
                DecorationMode::Classes,
            )
            .unwrap();
            let prefix = &text[..text.find("exports.locals = ").unwrap()];
            prop_assert!(out.starts_with(prefix));
            prop_assert!(out.ends_with("};"), "assertion failed: out.ends_with(\"}};\")");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Repeated requests for one style path alternate rewrite and
        /// pass-through, starting with a rewrite.
        #[test]
        fn prop_toggle_alternates(requests in 1usize..40, name in "[a-z]{1,8}") {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join(format!("{}.css.js", name)), "").unwrap();

            let mut pass = ResolutionPass::new();
            let request = format!("./{}.css", name);
            for i in 0..requests {
                let rewritten = matches!(
                    pass.resolve(dir.path(), &request),
                    ResolutionDecision::Rewrite { .. }
                );
                prop_assert_eq!(rewritten, i % 2 == 0);
            }
            prop_assert_eq!(
                pass.ledger().visits(&dir.path().join(format!("{}.css", name))),
                requests as u32
            );
        }
    }
}
