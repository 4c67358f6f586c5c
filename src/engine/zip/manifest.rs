use serde_json::{Map, Value};

/// Folds `a/b/c.txt` style keys into a directory tree. Directories nest
/// as objects; the files of each directory land in its `contents` array.
///
/// ```text
/// ["a/b/one.bin", "a/two.bin", "three.txt"] =>
/// {
///   "a": { "b": { "contents": ["one.bin"] }, "contents": ["two.bin"] },
///   "contents": ["three.txt"]
/// }
/// ```
pub fn nested_path_tree(keys: &[String]) -> Value {
    let mut root = Map::new();

    'keys: for key in keys {
        let mut parts: Vec<&str> = key.split('/').filter(|p| !p.is_empty()).collect();
        let leaf = match parts.pop() {
            Some(leaf) => leaf,
            None => continue,
        };

        let mut node = &mut root;
        for dir in parts {
            let child = node
                .entry(dir.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child.as_object_mut() {
                Some(obj) => node = obj,
                // A contents array already holds this name; skip rather than clobber.
                None => continue 'keys,
            }
        }

        let contents = node
            .entry("contents".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(list) = contents.as_array_mut() {
            list.push(Value::String(leaf.to_string()));
        }
    }

    Value::Object(root)
}
