//! Navigation over the shipped route table, with view modules read from disk.

use std::path::Path;
use std::sync::Arc;

use viewer_devserver::config::DevServerConfig;
use viewer_devserver::loader::ModuleLoader;
use viewer_devserver::routing::{
    BasePath, History, MemoryHistory, NavigationOutcome, NavigationResolver, NavigationStatus,
    NavigationTarget, RouteTable,
};

fn write_views(root: &Path) {
    let views = root.join("src/views");
    std::fs::create_dir_all(&views).unwrap();
    std::fs::write(views.join("HomeView.vue"), "<template><h1>Upload</h1></template>").unwrap();
    std::fs::write(views.join("Viewer.vue"), "<template><canvas id=\"cloud\"/></template>").unwrap();
}

fn resolver(root: &Path, base: &str) -> (NavigationResolver<MemoryHistory>, ModuleLoader) {
    let config = DevServerConfig::default();
    let table = RouteTable::from_config(&config.routes, root).unwrap();
    let base = BasePath::new(base);
    let loader = ModuleLoader::new();
    let history = MemoryHistory::new(base.join("/"));
    (
        NavigationResolver::new(Arc::new(table), loader.clone(), base, history),
        loader,
    )
}

#[tokio::test]
async fn test_viewer_then_back_returns_home_without_push() {
    let dir = tempfile::tempdir().unwrap();
    write_views(dir.path());
    let (resolver, loader) = resolver(dir.path(), "/");

    resolver.start().await;
    resolver.navigate("/viewer").await.unwrap();
    let state = resolver.state();
    assert_eq!(state.route_name(), Some("viewer"));
    assert!(state.module().unwrap().source.contains("cloud"));

    resolver.back().await.unwrap();
    let state = resolver.state();
    assert_eq!(state.route_name(), Some("home"));
    assert_eq!(state.location.as_deref(), Some("/"));
    assert_eq!(resolver.with_history(|h| (h.len(), h.position())), (2, 0));

    assert!(loader.is_cached("home"));
    assert!(loader.is_cached("viewer"));
}

#[tokio::test]
async fn test_sub_path_deployment() {
    let dir = tempfile::tempdir().unwrap();
    write_views(dir.path());
    let (resolver, _) = resolver(dir.path(), "/pointcloud/");

    resolver.start().await;
    assert_eq!(resolver.state().route_name(), Some("home"));

    resolver
        .navigate(NavigationTarget::named("viewer").with_param("file", "bridge.las"))
        .await
        .unwrap();
    assert_eq!(
        resolver.with_history(|h| h.location().to_string()),
        "/pointcloud/viewer?file=bridge.las"
    );
}

#[tokio::test]
async fn test_missing_view_file_is_recoverable() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = resolver(dir.path(), "/");

    let outcome = resolver.start().await;
    assert!(matches!(outcome, NavigationOutcome::Failed(ref e) if e.route == "home"));
    assert!(matches!(resolver.state().status, NavigationStatus::Failed { .. }));

    write_views(dir.path());
    let outcome = resolver.replace("/").await.unwrap();
    assert!(matches!(outcome, NavigationOutcome::Rendered { .. }));
    assert_eq!(resolver.with_history(|h| h.len()), 1);
}
