/// Language Profile Registry
///
/// Static recipes describing how to build (optionally) and run source code
/// for one language id. The table is the single source of truth: adding a
/// language means adding one row to [`BUILTIN_PROFILES`].
///
/// ## Command Placeholders
/// Every argv element may contain any of:
/// - `{source}`   absolute path of the written source file
/// - `{artifact}` absolute path of `<workspace>/<file_stem>`
/// - `{dir}`      absolute path of the workspace directory
/// - `{stem}`     the profile's `file_stem`
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    pub id: &'static str,
    pub file_stem: &'static str,
    pub extension: &'static str,
    pub compile: Option<&'static [&'static str]>,
    pub run: &'static [&'static str],
}

impl LanguageProfile {
    /// File name the source is written to inside the workspace
    pub fn source_file_name(&self) -> String {
        format!("{}{}", self.file_stem, self.extension)
    }

    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Distinct executables this profile needs on the host
    ///
    /// Commands that start with a placeholder (a compiled artifact) are skipped.
    pub fn toolchain(&self) -> Vec<&'static str> {
        let mut programs = Vec::new();
        let commands = self.compile.into_iter().chain(std::iter::once(self.run));

        for argv in commands {
            if let Some(program) = argv.first() {
                if !program.starts_with('{') && !programs.contains(program) {
                    programs.push(*program);
                }
            }
        }

        programs
    }
}

pub const BUILTIN_PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        id: "python",
        file_stem: "main",
        extension: ".py",
        compile: None,
        run: &["python3", "{source}"],
    },
    LanguageProfile {
        id: "javascript",
        file_stem: "main",
        extension: ".js",
        compile: None,
        run: &["node", "{source}"],
    },
    LanguageProfile {
        id: "c",
        file_stem: "main",
        extension: ".c",
        compile: Some(&["gcc", "{source}", "-o", "{artifact}"]),
        run: &["{artifact}"],
    },
    LanguageProfile {
        id: "cpp",
        file_stem: "main",
        extension: ".cpp",
        compile: Some(&["g++", "{source}", "-o", "{artifact}"]),
        run: &["{artifact}"],
    },
    LanguageProfile {
        id: "java",
        file_stem: "Main",
        extension: ".java",
        compile: Some(&["javac", "-d", "{dir}", "{source}"]),
        run: &["java", "-cp", "{dir}", "{stem}"],
    },
];

/// Immutable lookup table from language id to profile
#[derive(Debug, Clone)]
pub struct Registry {
    profiles: Vec<LanguageProfile>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    /// Build a registry from an arbitrary table
    ///
    /// Later rows with a duplicate id are ignored.
    pub fn new(profiles: impl IntoIterator<Item = LanguageProfile>) -> Self {
        let mut table = Vec::new();
        let mut index = HashMap::new();

        for profile in profiles {
            if index.contains_key(profile.id) {
                continue;
            }
            index.insert(profile.id, table.len());
            table.push(profile);
        }

        Self {
            profiles: table,
            index,
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_PROFILES.iter().copied())
    }

    /// Exact-match lookup: no case folding, no aliases
    ///
    /// `None` means "not supported", which is a normal outcome.
    pub fn resolve(&self, language: &str) -> Option<&LanguageProfile> {
        self.index.get(language).map(|&idx| &self.profiles[idx])
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.profiles.iter().map(|p| p.id).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_in_table_order() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.ids(),
            vec!["python", "javascript", "c", "cpp", "java"]
        );
    }

    #[test]
    fn test_resolve_is_exact_match() {
        let registry = Registry::builtin();
        assert!(registry.resolve("python").is_some());
        assert!(registry.resolve("Python").is_none());
        assert!(registry.resolve("PYTHON").is_none());
        assert!(registry.resolve("py").is_none());
        assert!(registry.resolve("ruby").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn test_compiled_languages() {
        let registry = Registry::builtin();
        let compiled: Vec<_> = registry
            .profiles()
            .iter()
            .filter(|p| p.is_compiled())
            .map(|p| p.id)
            .collect();
        assert_eq!(compiled, vec!["c", "cpp", "java"]);
    }

    #[test]
    fn test_java_runs_class_named_after_source() {
        let java = Registry::builtin().resolve("java").copied().unwrap();
        assert_eq!(java.source_file_name(), "Main.java");
        assert!(java.run.contains(&"{stem}"));
    }

    #[test]
    fn test_toolchain_skips_artifacts() {
        let registry = Registry::builtin();
        assert_eq!(registry.resolve("c").unwrap().toolchain(), vec!["gcc"]);
        assert_eq!(
            registry.resolve("java").unwrap().toolchain(),
            vec!["javac", "java"]
        );
        assert_eq!(registry.resolve("python").unwrap().toolchain(), vec!["python3"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_row() {
        let first = LanguageProfile {
            id: "shell",
            file_stem: "main",
            extension: ".sh",
            compile: None,
            run: &["sh", "{source}"],
        };
        let second = LanguageProfile {
            run: &["bash", "{source}"],
            ..first
        };

        let registry = Registry::new([first, second]);
        assert_eq!(registry.profiles().len(), 1);
        assert_eq!(registry.resolve("shell").unwrap().run, &["sh", "{source}"]);
    }
}
