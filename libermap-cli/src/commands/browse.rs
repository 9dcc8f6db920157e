//! Browse command - list the LiberData catalogue and download files.

use libermap::filetree::{FileTree, NodeKind};
use libermap::viewer::Command;

use crate::error::CliError;
use crate::runner::{drain_events, CliRunner, CliViewer};

/// Arguments for the browse command.
pub struct BrowseArgs {
    /// Repository path to expand; category roots when absent
    pub path: Option<String>,
    /// File leaf to save into the download directory
    pub download: Option<String>,
}

/// Run the browse command.
pub async fn run(args: BrowseArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("browse");
    let mut viewer = runner.create_viewer()?;
    let mut events = viewer.subscribe();

    if let Some(path) = &args.path {
        expand_to(&mut viewer, path).await;
    }
    if let Some(file) = &args.download {
        if let Some((parent, _)) = file.rsplit_once('/') {
            expand_to(&mut viewer, parent).await;
        }
        viewer.dispatch(Command::DownloadFile { path: file.clone() });
        viewer.settle().await;
    }

    if let Some(failure) = drain_events(&mut events) {
        return Err(CliError::Viewer(failure));
    }
    if args.download.is_none() {
        print_tree(viewer.file_tree());
    }
    Ok(())
}

/// Expand every directory on the way to `path`, listing each once.
pub async fn expand_to(viewer: &mut CliViewer, path: &str) {
    let path = path.trim_matches('/');
    let prefixes = path
        .match_indices('/')
        .map(|(i, _)| &path[..i])
        .chain(std::iter::once(path));

    for prefix in prefixes {
        let collapsed_dir = viewer
            .file_tree()
            .find_by_path(prefix)
            .and_then(|id| viewer.file_tree().node(id))
            .is_some_and(|node| node.is_directory() && !node.expanded);
        if collapsed_dir {
            viewer.dispatch(Command::ToggleFolder {
                path: prefix.to_string(),
            });
            viewer.settle().await;
        }
    }
}

/// Print the visible rows of `tree`, indented by depth.
pub fn print_tree(tree: &FileTree) {
    for (depth, id) in tree.visible_rows() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Directory { .. } => {
                println!("{}{} {}    [{}]", indent, node.indicator(), node.name, node.path)
            }
            NodeKind::File { download_url, .. } => {
                let url = download_url.as_deref().unwrap_or("(no download)");
                println!("{}  {}    {}", indent, node.name, url)
            }
        }
    }
}
