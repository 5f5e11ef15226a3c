use std::collections::HashSet;
use std::sync::Arc;

use blog_client::{BlogClientGrpc, Post};
use blog_server::application::post_service::PostService;
use blog_server::data::memory_store::InMemoryPostStore;
use blog_server::server::serve_with_incoming;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::Code;

struct TestServer {
    endpoint: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let post_service = Arc::new(PostService::new(Arc::new(InMemoryPostStore::new())));
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve_with_incoming(listener, post_service, None, async {
            let _ = rx.await;
        }));

        Self {
            endpoint: format!("http://{addr}"),
            shutdown: Some(tx),
            handle,
        }
    }

    async fn client(&self) -> BlogClientGrpc {
        BlogClientGrpc::connect(&self.endpoint).await.unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_blog_scenario_over_grpc() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let created = client
        .create_post(
            "u1".to_string(),
            "My first Blog".to_string(),
            "test content".to_string(),
        )
        .await
        .unwrap();
    assert!(!created.id.is_empty());

    let read = client.read_post(created.id.clone()).await.unwrap();
    assert_eq!(
        read,
        Post {
            id: created.id.clone(),
            author_id: "u1".to_string(),
            title: "My first Blog".to_string(),
            content: "test content".to_string(),
        }
    );

    let err = client.read_post("nonexistent".to_string()).await.unwrap_err();
    assert_eq!(err.code(), Some(Code::NotFound));

    let err = client
        .update_post(Post {
            id: "bogus".to_string(),
            ..read.clone()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    client
        .update_post(Post {
            content: "Updated content".to_string(),
            ..read.clone()
        })
        .await
        .unwrap();
    let updated = client.read_post(created.id.clone()).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.content, "Updated content");

    let deleted = client.delete_post(created.id.clone()).await.unwrap();
    assert_eq!(deleted.content, "Updated content");

    assert!(client.read_post(created.id.clone()).await.unwrap_err().is_not_found());
    assert!(client.delete_post(created.id).await.unwrap_err().is_not_found());

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_list_streams_every_post() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    assert!(client.list_posts().await.unwrap().is_empty());

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        let post = client
            .create_post("author".to_string(), title.to_string(), format!("{title} body"))
            .await
            .unwrap();
        ids.push(post.id);
    }

    let listed = client.list_posts().await.unwrap();
    assert_eq!(listed.len(), 3);
    let listed_ids: HashSet<String> = listed.iter().map(|p| p.id.clone()).collect();
    assert_eq!(listed_ids, ids.iter().cloned().collect());
    for post in &listed {
        assert_eq!(post.content, format!("{} body", post.title));
    }

    client.delete_post(ids[1].clone()).await.unwrap();
    let remaining: HashSet<String> = client
        .list_posts()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(remaining, HashSet::from([ids[0].clone(), ids[2].clone()]));

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let mut client = client.clone();
            tokio::spawn(async move {
                client
                    .create_post("author".to_string(), format!("post {i}"), String::new())
                    .await
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap());
    }
    assert_eq!(ids.len(), 20);

    let mut client = client;
    assert_eq!(client.list_posts().await.unwrap().len(), 20);

    drop(client);
    server.stop().await;
}
