//! Dot-separated path access into JSON values (`requirements.goal`, `steps.0.name`).

use super::tagged::DISCRIMINATOR;
use crate::error::{ConsoleError, ConsoleResult};
use serde_json::{Map, Value};

fn segments(path: &str) -> ConsoleResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConsoleError::input(format!("Invalid field path '{}'", path)));
    }
    Ok(segments)
}

pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments(path).ok()? {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set `path` to `value`, creating missing intermediate objects.
///
/// Siblings at every level are untouched. Numeric segments index existing array
/// elements. The discriminator can not be written this way.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> ConsoleResult<()> {
    let segments = segments(path)?;
    if segments.contains(&DISCRIMINATOR) {
        return Err(ConsoleError::input(format!(
            "'{}' is managed by the editor and can not be set",
            DISCRIMINATOR
        )));
    }

    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(ConsoleError::input("Empty field path")),
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let walked = segments[..=depth].join(".");
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => index_mut(items, segment, &walked)?,
            _ => {
                return Err(ConsoleError::input(format!(
                    "'{}' is not an object",
                    parents[..depth].join(".")
                )))
            }
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            *index_mut(items, last, path)? = value;
            Ok(())
        }
        _ => Err(ConsoleError::input(format!(
            "'{}' is not an object",
            parents.join(".")
        ))),
    }
}

fn index_mut<'a>(items: &'a mut [Value], segment: &str, walked: &str) -> ConsoleResult<&'a mut Value> {
    let len = items.len();
    segment
        .parse::<usize>()
        .ok()
        .and_then(move |i| items.get_mut(i))
        .ok_or_else(|| {
            ConsoleError::input(format!("'{}' is out of range (list has {} items)", walked, len))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_preserves_siblings_and_tags() {
        let mut doc = json!({
            "__type__": "PiaAGIPrompt",
            "requirements": {"__type__": "Requirements", "goal": "", "success_metrics": ["a"]}
        });
        set_path(&mut doc, "requirements.goal", json!("ship")).unwrap();
        assert_eq!(
            doc,
            json!({
                "__type__": "PiaAGIPrompt",
                "requirements": {"__type__": "Requirements", "goal": "ship", "success_metrics": ["a"]}
            })
        );
    }

    #[test]
    fn set_creates_missing_objects_and_indexes_arrays() {
        let mut doc = json!({"steps": [{"name": "a"}, {"name": "b"}], "meta": null});
        set_path(&mut doc, "steps.1.name", json!("B")).unwrap();
        set_path(&mut doc, "extra.deep.flag", json!(true)).unwrap();
        set_path(&mut doc, "meta.k", json!(1)).unwrap();
        assert_eq!(get_path(&doc, "steps.1.name"), Some(&json!("B")));
        assert_eq!(get_path(&doc, "extra.deep.flag"), Some(&json!(true)));
        assert_eq!(get_path(&doc, "meta.k"), Some(&json!(1)));
    }

    #[test]
    fn set_rejects_bad_paths() {
        let mut doc = json!({"name": "x", "steps": []});
        assert!(set_path(&mut doc, "__type__", json!("Other")).is_err());
        assert!(set_path(&mut doc, "name.inner", json!(1)).is_err());
        assert!(set_path(&mut doc, "steps.0.name", json!(1)).is_err());
        assert!(set_path(&mut doc, "a..b", json!(1)).is_err());
        assert_eq!(doc, json!({"name": "x", "steps": []}));
    }
}
