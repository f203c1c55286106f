//! Command templating.
//!
//! A step's command may contain three kinds of placeholder:
//!
//! * `{domain}`: the target, exactly as written in the target list.
//! * `{output_file}`: this step's own resolved output path.
//! * `name.output_file` or `{name.output_file}`: the resolved output path of
//!   an earlier step called `name`, wherever it appears in the command, glued
//!   to a flag (`-lsubs.output_file`) included.
//!
//! Rendering is one left-to-right pass over the template against an explicit
//! binding table. At each position the longest matching placeholder wins, so
//! with steps `sub` and `domainsub` the text `domainsub.output_file` always
//! names the latter. Substituted values are copied to the output and never
//! rescanned.

use std::path::{Path, PathBuf};

use sebat_common::scan::target::Target;

pub const DOMAIN_PLACEHOLDER: &str = "{domain}";
pub const OUTPUT_PLACEHOLDER: &str = "{output_file}";
const REFERENCE_SUFFIX: &str = ".output_file";

/// Output paths of the steps already processed for one target, in pipeline
/// order. Only these are visible to later steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    entries: Vec<(String, PathBuf)>,
}

impl ResolvedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step_name: impl Into<String>, path: PathBuf) {
        let step_name: String = step_name.into();
        match self.entries.iter_mut().find(|(name, _)| *name == step_name) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((step_name, path)),
        }
    }

    pub fn get(&self, step_name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(name, _)| name == step_name)
            .map(|(_, path)| path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One placeholder and the text it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub placeholder: String,
    pub value: String,
}

impl Binding {
    fn new(placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }
}

/// The outcome of rendering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub command: String,
    /// References left verbatim because no earlier step has that name.
    pub unresolved: Vec<String>,
}

pub struct Templater {
    /// Longest placeholder first; ties broken alphabetically.
    bindings: Vec<Binding>,
}

impl Templater {
    pub fn new(target: &Target, own_path: &Path, prior: &ResolvedPaths) -> Self {
        let mut bindings: Vec<Binding> = vec![
            Binding::new(DOMAIN_PLACEHOLDER, target.original()),
            Binding::new(OUTPUT_PLACEHOLDER, own_path.display().to_string()),
        ];

        for (name, path) in prior.iter() {
            let value: String = path.display().to_string();
            bindings.push(Binding::new(format!("{{{name}{REFERENCE_SUFFIX}}}"), value.clone()));
            bindings.push(Binding::new(format!("{name}{REFERENCE_SUFFIX}"), value));
        }

        bindings.sort_by(|a, b| {
            b.placeholder
                .len()
                .cmp(&a.placeholder.len())
                .then_with(|| a.placeholder.cmp(&b.placeholder))
        });

        Self { bindings }
    }

    /// The placeholder table, in the order it is matched.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn render(&self, template: &str) -> Rendered {
        let mut command: String = String::with_capacity(template.len());
        let mut unresolved: Vec<String> = Vec::new();
        let mut idx: usize = 0;

        while idx < template.len() {
            let rest: &str = &template[idx..];

            if let Some(binding) = self.bindings.iter().find(|b| rest.starts_with(&b.placeholder)) {
                command.push_str(&binding.value);
                idx += binding.placeholder.len();
                continue;
            }

            if rest.starts_with(REFERENCE_SUFFIX) {
                unresolved.push(format!("{}{REFERENCE_SUFFIX}", trailing_word(&command)));
                command.push_str(REFERENCE_SUFFIX);
                idx += REFERENCE_SUFFIX.len();
                continue;
            }

            let ch: char = match rest.chars().next() {
                Some(ch) => ch,
                None => break,
            };
            command.push(ch);
            idx += ch.len_utf8();
        }

        Rendered {
            command,
            unresolved,
        }
    }
}

/// The word `text` ends with: everything after the last whitespace, brace or
/// quote.
fn trailing_word(text: &str) -> &str {
    let start: usize = text
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || matches!(c, '{' | '\'' | '"'))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(entries: &[(&str, &str)]) -> ResolvedPaths {
        let mut resolved = ResolvedPaths::new();
        for (name, path) in entries {
            resolved.insert(*name, PathBuf::from(path));
        }
        resolved
    }

    #[test]
    fn domain_uses_original_target() {
        let target = Target::new("10.0.0.0/24").unwrap();
        let prior = ResolvedPaths::new();
        let own = PathBuf::from("out/10.0.0.0-24/probe/scan-at-2024-01-01");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered = templater.render("nmap {domain} -oN {output_file}");
        assert_eq!(
            rendered.command,
            "nmap 10.0.0.0/24 -oN out/10.0.0.0-24/probe/scan-at-2024-01-01"
        );
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn prior_references_resolve_braced_and_bare() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("subs", "out/example.com/subs/scan-at-d")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered = templater.render("cat subs.output_file {subs.output_file} > {output_file}");
        assert_eq!(
            rendered.command,
            "cat out/example.com/subs/scan-at-d out/example.com/subs/scan-at-d > own"
        );
    }

    #[test]
    fn longest_step_name_wins() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("sub", "SUB"), ("domainsub", "DOMAINSUB")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered = templater.render("x domainsub.output_file y sub.output_file -ldomainsub.output_file");
        assert_eq!(rendered.command, "x DOMAINSUB y SUB -lDOMAINSUB");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn references_glued_to_flags_are_substituted() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("subs", "S")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered =
            templater.render("tool -lsubs.output_file --in-subs.output_file cat x_subs.output_file");
        assert_eq!(rendered.command, "tool -lS --in-S cat x_S");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn step_names_with_dots_and_spaces_resolve() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("finder", "F"), ("sub.finder", "SF"), ("nmap top", "NT")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered =
            templater.render("cat sub.finder.output_file finder.output_file {nmap top.output_file}");
        assert_eq!(rendered.command, "cat SF F NT");
    }

    #[test]
    fn later_or_unknown_references_stay_verbatim() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("a", "A")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered = templater.render("run a.output_file c.output_file {self.output_file}");
        assert_eq!(rendered.command, "run A c.output_file {self.output_file}");
        assert_eq!(rendered.unresolved, vec!["c.output_file", "self.output_file"]);
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let target = Target::new("weird{output_file}").unwrap();
        let prior = ResolvedPaths::new();
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let rendered: Rendered = templater.render("echo {domain}");
        assert_eq!(rendered.command, "echo weird{output_file}");
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let target = Target::new("example.com").unwrap();
        let prior = ResolvedPaths::new();
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let template: &str = "echo 'résumé' | grep -E '{1,3}' > /dev/null";
        assert_eq!(templater.render(template).command, template);
    }

    #[test]
    fn bindings_are_matched_longest_first() {
        let target = Target::new("example.com").unwrap();
        let prior = paths(&[("b", "B"), ("a", "A")]);
        let own = PathBuf::from("own");
        let templater = Templater::new(&target, &own, &prior);

        let placeholders: Vec<String> = templater
            .bindings()
            .iter()
            .map(|b| format!("{}={}", b.placeholder, b.value))
            .collect();
        assert_eq!(
            placeholders,
            vec![
                "{a.output_file}=A",
                "{b.output_file}=B",
                "a.output_file=A",
                "b.output_file=B",
                "{output_file}=own",
                "{domain}=example.com",
            ]
        );
    }

    #[test]
    fn resolved_paths_insert_replaces_existing_entry() {
        let mut resolved = paths(&[("a", "first")]);
        resolved.insert("a", PathBuf::from("second"));

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("a"), Some(Path::new("second")));
    }
}
