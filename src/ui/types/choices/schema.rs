use anyhow::{Context, Result, bail};
use schemars::Schema;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A tagged sub-choice or a string enum; see [`FieldSpec::allowed`].
    Choice,
}

/// One settable parameter of a component, named by its dotted path.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed: Vec<String>,
}

type Object = Map<String, Value>;

/// Lists the parameters of the `kind_key` branch of a tagged choice schema.
/// Nested structs are flattened into dotted names; defaults are taken from
/// `defaults` when present.
pub fn specs_for_kind(root: &Schema, kind_key: &str, defaults: &Value) -> Result<Vec<FieldSpec>> {
    let root = root.as_object().context("root schema is not an object")?;
    let branches = root
        .get("oneOf")
        .or_else(|| root.get("anyOf"))
        .and_then(Value::as_array)
        .context("schema is not a tagged choice")?;

    let branch = branches
        .iter()
        .filter_map(Value::as_object)
        .find(|b| tag_of(b).as_deref() == Some(kind_key));
    let Some(branch) = branch else {
        bail!("no branch found for type={kind_key}");
    };

    let mut out = Vec::new();
    if let Some(params) = branch
        .get("properties")
        .and_then(|p| p.get("params"))
        .and_then(Value::as_object)
    {
        collect_fields(root, params, "", defaults, &mut out)?;
    }
    Ok(out)
}

fn collect_fields(
    root: &Object,
    schema: &Object,
    prefix: &str,
    defaults: &Value,
    out: &mut Vec<FieldSpec>,
) -> Result<()> {
    let schema = resolve(root, schema)?;
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, field) in properties {
        let field = field.as_object().context("field schema is not an object")?;
        let path = format!("{prefix}{name}");
        let default = defaults.get(name);
        let resolved = resolve(root, non_null_variant(field))?;

        if resolved.contains_key("properties") {
            collect_fields(
                root,
                resolved,
                &format!("{path}."),
                default.unwrap_or(&Value::Null),
                out,
            )?;
            continue;
        }

        let allowed = allowed_values(root, resolved);
        let kind = if allowed.is_empty() {
            match primitive_kind(resolved.get("type")) {
                Some(kind) => kind,
                None => continue,
            }
        } else {
            FieldKind::Choice
        };

        let text = |key: &str| {
            field
                .get(key)
                .or_else(|| resolved.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let bound = |keys: [&str; 2]| {
            keys.iter()
                .find_map(|k| resolved.get(*k).and_then(Value::as_f64))
        };

        out.push(FieldSpec {
            name: path,
            title: text("title"),
            description: text("description"),
            kind,
            default: default.cloned().or_else(|| field.get("default").cloned()),
            min: bound(["minimum", "exclusiveMinimum"]),
            max: bound(["maximum", "exclusiveMaximum"]),
            allowed,
        });
    }
    Ok(())
}

/// Follows a local `$ref` such as `#/$defs/TreeOptions`.
fn resolve<'a>(root: &'a Object, schema: &'a Object) -> Result<&'a Object> {
    let Some(reference) = schema.get("$ref").and_then(Value::as_str) else {
        return Ok(schema);
    };
    let path = reference
        .strip_prefix("#/")
        .with_context(|| format!("unsupported $ref '{reference}'"))?;
    let mut current = root;
    for segment in path.split('/') {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        current = current
            .get(&segment)
            .and_then(Value::as_object)
            .with_context(|| format!("dangling $ref '{reference}'"))?;
    }
    Ok(current)
}

/// `Option<T>` is rendered as `anyOf: [T, null]`; keep the `T` side.
fn non_null_variant(field: &Object) -> &Object {
    let Some(variants) = field.get("anyOf").and_then(Value::as_array) else {
        return field;
    };
    let non_null: Vec<&Object> = variants
        .iter()
        .filter_map(Value::as_object)
        .filter(|v| v.get("type").and_then(Value::as_str) != Some("null"))
        .collect();
    match non_null.as_slice() {
        [only] => only,
        _ => field,
    }
}

fn tag_of(branch: &Object) -> Option<String> {
    let tag = branch.get("properties")?.get("type")?;
    if let Some(constant) = tag.get("const").and_then(Value::as_str) {
        return Some(constant.to_string());
    }
    match tag.get("enum").and_then(Value::as_array)?.as_slice() {
        [only] => only.as_str().map(str::to_string),
        _ => None,
    }
}

/// Variant names of a string enum or of a tagged sub-choice.
fn allowed_values(root: &Object, schema: &Object) -> Vec<String> {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    let Some(branches) = schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    branches
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|b| resolve(root, b).ok())
        .filter_map(|b| {
            tag_of(b).or_else(|| {
                b.get("const")
                    .or_else(|| b.get("enum").and_then(|e| e.get(0)))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        })
        .collect()
}

fn primitive_kind(ty: Option<&Value>) -> Option<FieldKind> {
    let parse = |s: &str| match s {
        "string" => Some(FieldKind::String),
        "integer" => Some(FieldKind::Integer),
        "number" => Some(FieldKind::Number),
        "boolean" => Some(FieldKind::Boolean),
        _ => None,
    };
    match ty? {
        Value::String(s) => parse(s),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find_map(parse),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::types::choices::{LearnerChoice, LearnerKind, StreamChoice, StreamKind, UIChoice};

    fn specs<C: UIChoice>(kind: C::Kind) -> Vec<FieldSpec> {
        specs_for_kind(&C::schema(), &kind.to_string(), &C::default_params(kind)).unwrap()
    }

    fn field<'a>(specs: &'a [FieldSpec], name: &str) -> &'a FieldSpec {
        specs
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing {name}"))
    }

    #[test]
    fn tree_options_are_flattened() {
        let specs = specs::<LearnerChoice>(LearnerKind::AdaptiveHoeffdingTree);
        let grace = field(&specs, "grace_period");
        assert_eq!(grace.kind, FieldKind::Integer);
        assert_eq!(grace.min, Some(1.0));
        assert_eq!(grace.default, Some(Value::from(200)));
        assert_eq!(grace.title.as_deref(), Some("Grace Period"));

        let leaf = field(&specs, "leaf_prediction");
        assert_eq!(leaf.kind, FieldKind::Choice);
        assert!(leaf.allowed.iter().any(|v| v == "adaptive-naive-bayes"));

        let promotion = field(&specs, "promotion");
        assert_eq!(promotion.kind, FieldKind::Choice);
        assert!(promotion.allowed.iter().any(|v| v == "trial-window"));
        assert!(promotion.allowed.iter().any(|v| v == "error-bound"));
    }

    #[test]
    fn optional_fields_keep_their_primitive_kind() {
        let abrupt = specs::<StreamChoice>(StreamKind::AbruptDrift);
        assert_eq!(field(&abrupt, "max_instances").kind, FieldKind::Integer);
        let drift = field(&abrupt, "conditional_drift");
        assert_eq!(drift.kind, FieldKind::Number);
        assert_eq!(drift.max, Some(1.0));

        let arff = specs::<StreamChoice>(StreamKind::ArffFile);
        assert_eq!(field(&arff, "path").kind, FieldKind::String);
        assert_eq!(field(&arff, "class_index").kind, FieldKind::Integer);
    }

    #[test]
    fn nested_stream_params_get_dotted_names() {
        let gradual = specs::<StreamChoice>(StreamKind::GradualDrift);
        let burn_in = field(&gradual, "drift.burn_in");
        assert_eq!(burn_in.kind, FieldKind::Integer);
        assert_eq!(burn_in.default, Some(Value::from(10_000)));
        assert_eq!(field(&gradual, "drift_duration").kind, FieldKind::Integer);
        assert!(gradual.iter().all(|s| s.name != "drift"));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let defaults = Value::Null;
        assert!(specs_for_kind(&StreamChoice::schema(), "nope", &defaults).is_err());
    }

    #[test]
    fn local_refs_resolve() {
        let root: Object = serde_json::from_value(serde_json::json!({
            "$defs": { "A": { "type": "integer" } }
        }))
        .unwrap();
        let reference: Object =
            serde_json::from_value(serde_json::json!({ "$ref": "#/$defs/A" })).unwrap();
        assert_eq!(resolve(&root, &reference).unwrap()["type"], "integer");
        let dangling: Object =
            serde_json::from_value(serde_json::json!({ "$ref": "#/$defs/B" })).unwrap();
        assert!(resolve(&root, &dangling).is_err());
    }
}
