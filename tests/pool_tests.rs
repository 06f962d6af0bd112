mod common;

use std::sync::Arc;

use common::mock_server::{ann_reply, MockServer};
use common::vectors::random_vectors;

use tokio::task::JoinSet;

use annwire::client::AnnClient;
use annwire::error::ClientError;
use annwire::pool::ClientPool;
use annwire::types::{IndexSpec, Metric};

fn spec() -> IndexSpec {
    IndexSpec::new(8, Metric::Angular, 16, 100).unwrap()
}

#[tokio::test]
async fn test_pool_rejects_zero_size() {
    let server = MockServer::start().await;
    let result = ClientPool::connect(&server.config(), spec(), 0).await;
    assert!(matches!(result, Err(ClientError::Validation(_))));
}

#[tokio::test]
async fn test_concurrent_searches() {
    let server = MockServer::start().await;
    let pool = Arc::new(ClientPool::connect(&server.config(), spec(), 3).await.unwrap());
    assert_eq!(pool.size(), 3);
    assert_eq!(pool.available(), 3);

    let queries = random_vectors(20, 8);
    let mut tasks = JoinSet::new();
    for query in queries {
        let pool = pool.clone();
        tasks.spawn(async move { pool.search(40, 5, &query).await });
    }
    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    assert_eq!(pool.available(), 3);
    assert_eq!(server.commands_with_verb("SEARCH").len(), 20);
}

#[tokio::test]
async fn test_acquire_and_release() {
    let server = MockServer::start().await;
    let pool = ClientPool::connect(&server.config(), spec(), 2).await.unwrap();

    {
        let mut first = pool.acquire().await.unwrap();
        let _second = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);
        assert_eq!(first.memory_usage().await.unwrap(), 4096);
    }
    assert_eq!(pool.available(), 2);

    let results = pool.batch_search(10, 2, &random_vectors(4, 8)).await.unwrap();
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn test_desynchronized_client_is_discarded() {
    let server = MockServer::start_with(Arc::new(|command: &str| {
        if command == "MEMORY" {
            None
        } else {
            ann_reply(command)
        }
    }))
    .await;
    let config = server.config();

    let mut clients = Vec::new();
    for _ in 0..2 {
        let mut client = AnnClient::connect(&config).await.unwrap();
        client.attach_index(spec()).unwrap();
        clients.push(client);
    }
    let pool = ClientPool::from_clients(clients);

    {
        let mut client = pool.acquire().await.unwrap();
        assert!(client.memory_usage().await.is_err());
    }
    assert_eq!(pool.size(), 1);
    assert_eq!(pool.available(), 1);

    // The survivor still serves searches.
    pool.search(10, 3, &random_vectors(1, 8)[0]).await.unwrap();

    {
        let mut client = pool.acquire().await.unwrap();
        assert!(client.memory_usage().await.is_err());
    }
    assert_eq!(pool.size(), 0);
    assert!(matches!(
        pool.acquire().await.map(|_| ()),
        Err(ClientError::Desynchronized)
    ));
}
