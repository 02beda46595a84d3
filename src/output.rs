// src/output.rs
//
// Disk layer. Writes are gated on content: size first, then SHA-256, so
// an unchanged artifact never touches mtime and downstream builds only
// recompile what the input actually moved. The impl tree instead gates
// on existence, so hand-completed stubs survive regeneration. PathPlanner
// keeps generated paths collision-free on case-insensitive filesystems.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::errors::Error;
use crate::identity::clean_name_all_underscore;
use crate::store::{SymbolGraph, TypeDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

fn unchanged(path: &Path, content: &str) -> std::io::Result<bool> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Ok(false),
    };
    if meta.len() != content.len() as u64 {
        return Ok(false);
    }
    let existing = fs::read(path)?;
    Ok(Sha256::digest(&existing) == Sha256::digest(content.as_bytes()))
}

pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome, Error> {
    if unchanged(path, content).map_err(|e| Error::output_io(path, e))? {
        tracing::debug!(path = %path.display(), "content unchanged, skipping write");
        return Ok(WriteOutcome::Unchanged);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::output_io(path, e))?;
    }
    fs::write(path, content).map_err(|e| Error::output_io(path, e))?;
    Ok(WriteOutcome::Written)
}

/// Write gating for the impl tree: an existing file is somebody's
/// hand-completed stub and is never overwritten.
pub fn write_if_absent(path: &Path, content: &str) -> Result<WriteOutcome, Error> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "override present, keeping it");
        return Ok(WriteOutcome::Unchanged);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::output_io(path, e))?;
    }
    fs::write(path, content).map_err(|e| Error::output_io(path, e))?;
    Ok(WriteOutcome::Written)
}

/// Allocates relative output paths. Distinct owners wanting the same path
/// (same cleaned name, or names differing only in case) get a stable
/// 8-hex suffix derived from the owner's qualified name, so re-runs place
/// every file exactly where the previous run did.
#[derive(Debug, Default)]
pub struct PathPlanner {
    taken: FxHashMap<String, String>,
}

impl PathPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, preferred: &str, owner: &str) -> String {
        let key = preferred.to_ascii_lowercase();
        if let Some(holder) = self.taken.get(&key) {
            if holder == owner {
                return preferred.to_string();
            }
            let suffixed = suffix_path(preferred, owner);
            self.taken
                .insert(suffixed.to_ascii_lowercase(), owner.to_string());
            return suffixed;
        }
        self.taken.insert(key, owner.to_string());
        preferred.to_string()
    }
}

fn suffix_path(preferred: &str, owner: &str) -> String {
    let digest = Sha256::digest(owner.as_bytes());
    let tag = hex::encode(&digest[..4]);
    match preferred.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{tag}.{ext}"),
        None => format!("{preferred}_{tag}"),
    }
}

fn unit_dir(graph: &SymbolGraph, def: &TypeDef, root: &str) -> String {
    let mut parts = vec![root.to_string()];
    parts.extend(crate::emit::namespace_parts(graph, def.key.namespace));
    parts.join("/")
}

// File stems flatten special characters to underscores instead of the
// letter substitutions used for identifiers.
fn unit_file(graph: &SymbolGraph, def: &TypeDef, root: &str, ext: &str) -> String {
    let name = graph.names.resolve(def.key.name).replace('+', "_");
    format!(
        "{}/{}.{ext}",
        unit_dir(graph, def, root),
        clean_name_all_underscore(&name)
    )
}

pub fn unit_source_path(graph: &SymbolGraph, def: &TypeDef) -> String {
    unit_file(graph, def, "src", "cpp")
}

pub fn unit_stub_path(graph: &SymbolGraph, def: &TypeDef) -> String {
    unit_file(graph, def, "impl", "cpp")
}

pub fn unit_template_path(graph: &SymbolGraph, def: &TypeDef) -> String {
    unit_file(graph, def, "src", "h")
}

pub fn unit_template_stub_path(graph: &SymbolGraph, def: &TypeDef) -> String {
    unit_file(graph, def, "impl", "h")
}

pub fn assembly_header_path(assembly: &str) -> String {
    format!("src/{assembly}.h")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::FrontendProvider;

    #[test]
    fn rewrite_with_same_content_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/Demo/Program.cpp");
        assert_eq!(
            write_if_changed(&path, "int x;\n").unwrap(),
            WriteOutcome::Written
        );
        assert_eq!(
            write_if_changed(&path, "int x;\n").unwrap(),
            WriteOutcome::Unchanged
        );
        assert_eq!(
            write_if_changed(&path, "int y;\n").unwrap(),
            WriteOutcome::Written
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "int y;\n");
    }

    #[test]
    fn same_size_different_content_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp");
        write_if_changed(&path, "int x;\n").unwrap();
        assert_eq!(
            write_if_changed(&path, "int z;\n").unwrap(),
            WriteOutcome::Written
        );
    }

    #[test]
    fn existing_stub_overrides_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("impl/Demo/Program.cpp");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "// hand written\n").unwrap();
        assert_eq!(
            write_if_absent(&path, "throw 1;\n").unwrap(),
            WriteOutcome::Unchanged
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "// hand written\n");
    }

    #[test]
    fn colliding_paths_get_stable_suffixes() {
        let mut planner = PathPlanner::new();
        let first = planner.allocate("src/Demo/value.cpp", "Demo.value");
        let second = planner.allocate("src/Demo/Value.cpp", "Demo.Value");
        assert_eq!(first, "src/Demo/value.cpp");
        assert_ne!(second, "src/Demo/Value.cpp");
        assert!(second.starts_with("src/Demo/Value_"));
        assert!(second.ends_with(".cpp"));

        // a fresh planner hands out the same suffix
        let mut again = PathPlanner::new();
        again.allocate("src/Demo/value.cpp", "Demo.value");
        assert_eq!(again.allocate("src/Demo/Value.cpp", "Demo.Value"), second);

        // same owner re-asking gets its reserved path back
        assert_eq!(
            planner.allocate("src/Demo/value.cpp", "Demo.value"),
            "src/Demo/value.cpp"
        );
    }

    #[test]
    fn unit_paths_follow_the_namespace_tree() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Outer+Inner", "namespace": "Demo.Deep", "kind": "Reference" }
                 ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&provider, &[]).unwrap();
        let def = graph.type_def(graph.find_type("Demo.Deep.Outer+Inner", 0).unwrap());
        assert_eq!(unit_source_path(&graph, def), "src/Demo/Deep/Outer_Inner.cpp");
        assert_eq!(unit_stub_path(&graph, def), "impl/Demo/Deep/Outer_Inner.cpp");
        assert_eq!(unit_template_path(&graph, def), "src/Demo/Deep/Outer_Inner.h");
        assert_eq!(assembly_header_path("Demo"), "src/Demo.h");
    }

    #[test]
    fn unit_file_stems_flatten_special_characters() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "<>c__DisplayClass0_0", "namespace": "Demo", "kind": "Reference" }
                 ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&provider, &[]).unwrap();
        let def = graph.type_def(graph.find_type("Demo.<>c__DisplayClass0_0", 0).unwrap());
        // underscores on disk, not the identifier letter substitutions
        assert_eq!(unit_source_path(&graph, def), "src/Demo/__c__DisplayClass0_0.cpp");
        assert_ne!(
            unit_source_path(&graph, def),
            format!("src/Demo/{}.cpp", crate::emit::native_type_name(&graph, def))
        );
    }
}
