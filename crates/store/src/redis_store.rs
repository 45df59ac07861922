//! Redis-backed [`KeyValueStore`].

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{
    AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult,
};
use shelf_kernel::settings::StoreSettings;

use crate::{KeyValueStore, StoreError};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::new(err.to_string())
    }
}

enum Slot {
    /// No live connection; the next operation opens one.
    Idle,
    Open(MultiplexedConnection),
    /// `disconnect` ran; no further connections are opened.
    Closed,
}

fn closed() -> StoreError {
    StoreError::new("redis connection has been closed")
}

/// One long-lived multiplexed connection to a Redis server.
///
/// The connection is opened on first use, so building the store succeeds
/// even when Redis is down. Concurrent requests share the same connection;
/// the client pipelines their commands. When the connection drops, the
/// failing command returns its error and the next command reconnects.
pub struct RedisStore {
    client: Client,
    slot: Mutex<Slot>,
}

impl RedisStore {
    /// Build a client for `settings.host:settings.port`, authenticating with
    /// the optional password and selecting `settings.database`.
    pub fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(settings.host.clone(), settings.port),
            redis: RedisConnectionInfo {
                db: settings.database,
                password: settings.password.clone(),
                ..RedisConnectionInfo::default()
            },
        };
        let client = Client::open(info)?;

        tracing::info!(
            address = %settings.address(),
            database = settings.database,
            authenticated = settings.password.is_some(),
            "redis client configured"
        );

        Ok(Self {
            client,
            slot: Mutex::new(Slot::Idle),
        })
    }

    fn cached(&self) -> Result<Option<MultiplexedConnection>, StoreError> {
        match &*self.slot.lock() {
            Slot::Open(conn) => Ok(Some(conn.clone())),
            Slot::Closed => Err(closed()),
            Slot::Idle => Ok(None),
        }
    }

    /// The shared connection, opening it if needed. The lock is not held
    /// while connecting; if two tasks race, the first stored connection wins.
    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        if let Some(conn) = self.cached()? {
            return Ok(conn);
        }

        let conn = self.client.get_multiplexed_async_connection().await?;

        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Open(existing) => Ok(existing.clone()),
            Slot::Closed => Err(closed()),
            Slot::Idle => {
                tracing::debug!("redis connection established");
                *slot = Slot::Open(conn.clone());
                Ok(conn)
            }
        }
    }

    /// Convert a command result, forgetting the connection when it is dead.
    fn settle<T>(&self, result: RedisResult<T>) -> Result<T, StoreError> {
        result.map_err(|err| {
            if err.is_connection_dropped() || err.is_unrecoverable_error() || err.is_io_error() {
                let mut slot = self.slot.lock();
                if let Slot::Open(_) = *slot {
                    *slot = Slot::Idle;
                    tracing::warn!(error = %err, "redis connection lost; reconnecting on next use");
                }
            }
            StoreError::from(err)
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> Result<String, StoreError> {
        let mut conn = self.connection().await?;
        let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        self.settle(result)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let result: RedisResult<Option<String>> = conn.get(key).await;
        self.settle(result)
    }

    async fn set(&self, key: &str, value: &str) -> Result<String, StoreError> {
        let mut conn = self.connection().await?;
        let result: RedisResult<String> = conn.set(key, value).await;
        self.settle(result)
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        let result: RedisResult<i64> = conn.sadd(set_key, member).await;
        self.settle(result)
    }

    async fn disconnect(&self) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Closed);
        if let Slot::Open(_) = previous {
            tracing::info!("redis connection closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one RESP array command; `None` at end of stream.
    async fn read_command(stream: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<String>>> {
        let mut line = String::new();
        if stream.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let count: usize = line.trim_end().trim_start_matches('*').parse().unwrap_or(0);

        let mut parts = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            stream.read_line(&mut line).await?;
            let len: usize = line.trim_end().trim_start_matches('$').parse().unwrap_or(0);
            let mut buf = vec![0; len + 2];
            stream.read_exact(&mut buf).await?;
            buf.truncate(len);
            parts.push(String::from_utf8_lossy(&buf).into_owned());
        }
        Ok(Some(parts))
    }

    /// Minimal RESP server answering `PING` with `PONG` and anything else
    /// with `OK`. The first connection is closed right after its first
    /// `PING` reply; later connections stay up.
    async fn spawn_flaky_server() -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut stream = BufReader::new(socket);
                    while let Ok(Some(command)) = read_command(&mut stream).await {
                        let is_ping = command
                            .first()
                            .is_some_and(|name| name.eq_ignore_ascii_case("PING"));
                        let reply: &[u8] = if is_ping { b"+PONG\r\n" } else { b"+OK\r\n" };
                        if stream.get_mut().write_all(reply).await.is_err() {
                            return;
                        }
                        if is_ping && index == 0 {
                            return;
                        }
                    }
                });
            }
        });

        (addr, accepted)
    }

    fn unreachable_settings() -> StoreSettings {
        StoreSettings {
            host: "127.0.0.1".to_string(),
            // Reserved port; nothing listens here.
            port: 1,
            ..StoreSettings::default()
        }
    }

    #[tokio::test]
    async fn unreachable_server_surfaces_as_store_error() {
        let store = RedisStore::connect(&unreachable_settings()).unwrap();
        let err = store.ping().await.unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[tokio::test]
    async fn reconnects_after_the_server_drops_the_connection() {
        let (addr, accepted) = spawn_flaky_server().await;
        let store = RedisStore::connect(&StoreSettings {
            host: addr.ip().to_string(),
            port: addr.port(),
            ..StoreSettings::default()
        })
        .unwrap();

        assert_eq!(store.ping().await.unwrap(), "PONG");

        // The command that hits the dead socket fails; a later one reconnects.
        let mut recovered = None;
        for _ in 0..5 {
            if let Ok(pong) = store.ping().await {
                recovered = Some(pong);
                break;
            }
        }
        assert_eq!(recovered.as_deref(), Some("PONG"));
        assert!(accepted.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_closes_the_store() {
        let store = RedisStore::connect(&unreachable_settings()).unwrap();
        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();

        let err = store.get("anything").await.unwrap_err();
        assert_eq!(err.message(), "redis connection has been closed");
    }
}
