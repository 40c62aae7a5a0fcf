use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

/// Runs a jq filter over one document, collecting every output.
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File {
        code: filter_src,
        path: (),
    };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| anyhow!("jq filter `{filter_src}` failed: {e:?}"))?;
        // Val's Display is JSON text
        out.push(serde_json::from_str(&val.to_string())?);
    }
    Ok(out)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

type UndefinedErrors<'a> = Vec<(load::File<&'a str, ()>, Vec<(&'a str, Undefined)>)>;

fn format_undefined_errors(errs: UndefinedErrors<'_>) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_outputs_become_values() {
        let doc = json!({"items": [{"id": 1}, {"id": "two"}]});
        let out = apply_filter(".items[].id", &doc).unwrap();
        assert_eq!(out, vec![json!(1), json!("two")]);
    }

    #[test]
    fn parse_errors_are_reported() {
        let err = apply_filter(".items[", &json!({})).unwrap_err();
        assert!(err.to_string().contains("parse error"), "{err}");
    }
}
