// src/core/graph_display.rs

use crate::core::{error::BuildResult, project::Project, target::Target};
use std::collections::HashSet;
use std::sync::Arc;

/// Renders the dependency tree of `root` as ASCII art.
///
/// Fails like a build would if the project's graph is broken. A target that
/// appears a second time is printed with a marker and not expanded again.
pub fn render_target_tree(project: &Project, root: &str) -> BuildResult<String> {
    project.resolve_order(root)?;

    let mut out = format!("{}\n", root);
    let mut shown: HashSet<String> = HashSet::from([root.to_string()]);
    if let Some(target) = project.target(root) {
        render_children(project, target, "", &mut shown, &mut out);
    }
    Ok(out)
}

fn render_children(
    project: &Project,
    target: &Arc<Target>,
    prefix: &str,
    shown: &mut HashSet<String>,
    out: &mut String,
) {
    let dependencies = target.dependencies();
    for (i, dependency) in dependencies.iter().enumerate() {
        let is_last = i + 1 == dependencies.len();
        let connector = if is_last { "└─" } else { "├─" };

        let first_time = shown.insert(dependency.clone());
        let marker = if first_time {
            String::new()
        } else {
            format!(" {}", t!("tree.already_shown"))
        };
        out.push_str(&format!("{}{}{}{}\n", prefix, connector, dependency, marker));

        if first_time {
            if let Some(child) = project.target(dependency) {
                let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
                render_children(project, child, &child_prefix, shown, out);
            }
        }
    }
}

/// Renders the `--projecthelp` listing: description, main targets with their
/// descriptions, the other targets, and the default target.
pub fn render_project_help(project: &Project) -> String {
    let mut out = String::new();
    if let Some(description) = project.description() {
        out.push_str(&format!("{}\n\n", description));
    }

    let mut main: Vec<&Arc<Target>> = Vec::new();
    let mut other: Vec<&Arc<Target>> = Vec::new();
    for target in project.targets_in_order() {
        if target.is_main() {
            main.push(target);
        } else {
            other.push(target);
        }
    }
    if main.is_empty() && other.is_empty() {
        out.push_str(&format!("{}\n", t!("help.no_targets")));
        return out;
    }
    main.sort_by(|a, b| a.name().cmp(b.name()));
    other.sort_by(|a, b| a.name().cmp(b.name()));

    let width = main.iter().map(|t| t.name().len()).max().unwrap_or(0);
    if !main.is_empty() {
        out.push_str(&format!("{}\n\n", t!("help.main_targets")));
        for target in &main {
            out.push_str(&format!(
                " {:<width$}  {}\n",
                target.name(),
                target.description().unwrap_or_default(),
                width = width
            ));
        }
    }
    if !other.is_empty() {
        out.push_str(&format!("{}\n\n", t!("help.other_targets")));
        for target in &other {
            out.push_str(&format!(" {}\n", target.name()));
        }
    }
    if let Some(default) = project.default_target_name() {
        out.push_str(&format!("{} {}\n", t!("help.default_target"), default));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BuildError;

    fn sample() -> Project {
        let mut project = Project::new();
        project.set_description(Some("Sample project".to_string()));
        project.add_target(Target::new("init")).unwrap();
        project
            .add_target(Target::new("compile").depends_on("init"))
            .unwrap();
        project
            .add_target(Target::new("resources").depends_on("init"))
            .unwrap();
        project
            .add_target(
                Target::new("dist")
                    .depends_on("compile")
                    .depends_on("resources")
                    .with_description("Builds the distribution"),
            )
            .unwrap();
        project
            .add_target(Target::new("clean").with_description("Removes output"))
            .unwrap();
        project
    }

    #[test]
    fn test_tree_marks_repeated_nodes() {
        let tree = render_target_tree(&sample(), "dist").unwrap();
        let expected = format!(
            "dist\n├─compile\n│  └─init\n└─resources\n   └─init {}\n",
            t!("tree.already_shown")
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_tree_of_unknown_target_fails() {
        assert!(matches!(
            render_target_tree(&sample(), "ghost"),
            Err(BuildError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_project_help_lists_targets() {
        let help = render_project_help(&sample());
        assert!(help.starts_with("Sample project\n\n"));
        assert!(help.contains(" clean  Removes output\n"));
        assert!(help.contains(" dist   Builds the distribution\n"));
        assert!(help.contains(" compile\n"));
        assert!(help.ends_with(&format!("{} init\n", t!("help.default_target"))));
        let main_at = help.find(t!("help.main_targets")).unwrap();
        let other_at = help.find(t!("help.other_targets")).unwrap();
        assert!(main_at < other_at);
    }

    #[test]
    fn test_project_help_without_targets() {
        let help = render_project_help(&Project::new());
        assert_eq!(help, format!("{}\n", t!("help.no_targets")));
    }
}
