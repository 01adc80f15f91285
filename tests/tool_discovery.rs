//! Merge executable discovery against real directory trees.

mod fixtures;

use fixtures::{RecordingTool, Workspace};
use ilmerge_task::config::ResolveError;
use ilmerge_task::locator::{ExecutableLocator, OsFileSystem, SearchRoots, Strategy, ToolIdentity};
use ilmerge_task::{MergeTask, TaskError};

fn locator(roots: SearchRoots) -> ExecutableLocator<OsFileSystem> {
    ExecutableLocator::new(OsFileSystem, ToolIdentity::default(), roots)
}

#[test]
fn test_solution_packages_pick_highest_version() {
    let ws = Workspace::new();
    let packages = ws.root().join("packages");
    ws.touch(&packages.join("ILMerge.2.14.1208").join("tools").join("ILMerge.exe"), "MZ");
    let latest = ws.touch(&packages.join("ILMerge.3.0.41").join("tools").join("ILMerge.exe"), "MZ");
    ws.touch(&packages.join("Newtonsoft.Json.13.0.1").join("ILMerge.exe"), "MZ");
    let tool = RecordingTool::default();

    let report = MergeTask::new(ws.context()).run(|_| &tool).unwrap();
    assert_eq!(report.tool_path, latest);
}

#[test]
fn test_latest_package_without_executable_misses() {
    let ws = Workspace::new();
    let packages = ws.root().join("packages");
    ws.touch(&packages.join("ILMerge.2.14.1208").join("ILMerge.exe"), "MZ");
    ws.touch(&packages.join("ILMerge.3.0.41").join("readme.txt"), "");

    let roots = SearchRoots {
        solution_dir: Some(ws.root().to_path_buf()),
        ..Default::default()
    };
    let err = locator(roots).locate().unwrap_err();
    assert!(err.to_string().contains("ILMerge.exe"));
}

#[test]
fn test_package_folder_scan_from_task_location() {
    let ws = Workspace::new();
    // <root>/ILMerge.MSBuild.Task/build is where this task would live;
    // two levels up is the package root
    let task_dir = ws.root().join("ILMerge.MSBuild.Task").join("build");
    std::fs::create_dir_all(&task_dir).unwrap();
    let exe = ws.touch(
        &ws.root().join("ilmerge.3.0.41").join("tools").join("net452").join("ILMerge.exe"),
        "MZ",
    );

    let roots = SearchRoots {
        task_dir: Some(task_dir),
        ..Default::default()
    };
    let located = locator(roots).locate().unwrap();
    assert_eq!(located.strategy, Strategy::PackageFolder);
    assert_eq!(located.path, exe);
}

#[test]
fn test_target_dir_tools_subdirectory() {
    let ws = Workspace::new();
    let exe = ws.touch(&ws.target_dir().join("tools").join("ILMerge.exe"), "MZ");

    let located = locator(SearchRoots {
        target_dir: Some(ws.target_dir()),
        ..Default::default()
    })
    .locate()
    .unwrap();
    assert_eq!(located.strategy, Strategy::TargetDirectory);
    assert_eq!(located.path, exe);
}

#[test]
fn test_console_path_wins_over_other_locations() {
    let ws = Workspace::new();
    ws.install_tool();
    let console = ws.touch(&ws.root().join("console").join("ILMerge.exe"), "MZ");
    let mut context = ws.context();
    context.console_path = console.to_string_lossy().into_owned();
    let tool = RecordingTool::default();

    let report = MergeTask::new(context).run(|_| &tool).unwrap();
    assert_eq!(report.tool_path, console);
}

#[test]
fn test_missing_console_path_is_fatal() {
    let ws = Workspace::new();
    ws.install_tool();
    let mut context = ws.context();
    context.console_path = ws.root().join("nope").join("ILMerge.exe").to_string_lossy().into_owned();
    let tool = RecordingTool::default();

    let err = MergeTask::new(context).run(|_| &tool).unwrap_err();
    assert!(matches!(err, TaskError::Resolve(ResolveError::ConsolePathMissing(_))));
    assert!(tool.calls.borrow().is_empty());
}

#[test]
fn test_custom_tool_identity() {
    let ws = Workspace::new();
    let exe = ws.touch(&ws.target_dir().join("Merger.exe"), "MZ");
    let tool = RecordingTool::default();

    let report = MergeTask::new(ws.context())
        .with_tool_identity(ToolIdentity {
            executable: "Merger.exe".to_string(),
            package_prefix: "Merger".to_string(),
        })
        .run(|_| &tool)
        .unwrap();
    assert_eq!(report.tool_path, exe);
}

#[test]
fn test_package_folder_scan_global_packages_layout() {
    let ws = Workspace::new();
    let task_dir = ws.root().join("Scotec.ILMerge.MSBuild.Task").join("build");
    std::fs::create_dir_all(&task_dir).unwrap();
    let exe = ws.touch(
        &ws.root().join("ilmerge").join("3.0.41").join("tools").join("ILMerge.exe"),
        "MZ",
    );

    let roots = SearchRoots {
        task_dir: Some(task_dir),
        ..Default::default()
    };
    let located = locator(roots).locate().unwrap();
    assert_eq!(located.strategy, Strategy::PackageFolder);
    assert_eq!(located.path, exe);
}

#[test]
fn test_solution_packages_without_version_suffix() {
    let ws = Workspace::new();
    let exe = ws.touch(
        &ws.root().join("packages").join("ILMerge").join("tools").join("ILMerge.exe"),
        "MZ",
    );

    let roots = SearchRoots {
        solution_dir: Some(ws.root().to_path_buf()),
        ..Default::default()
    };
    let located = locator(roots).locate().unwrap();
    assert_eq!(located.strategy, Strategy::SolutionPackages);
    assert_eq!(located.path, exe);
}
