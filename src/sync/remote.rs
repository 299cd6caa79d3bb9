//! Asynchronous replica of the room state behind `/api/rooms/{code}/state`.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::state::{game::GameState, room::RoomCode};

use super::error::RemoteResult;

/// Remote, best-effort copy of each room's state.
pub trait RemoteStore: Send + Sync {
    /// Upload the serialized state for `room`.
    fn push_state(&self, room: RoomCode, state: GameState) -> BoxFuture<'static, RemoteResult<()>>;
    /// Download the state for `room`; a missing room is an error status.
    fn fetch_state(&self, room: RoomCode) -> BoxFuture<'static, RemoteResult<GameState>>;
    /// Drop the remote copy for `room`.
    fn delete_state(&self, room: RoomCode) -> BoxFuture<'static, RemoteResult<()>>;
}

#[cfg(feature = "remote-sync")]
pub use self::http::HttpRemoteStore;

/// Remote replica for `server_url`, or `None` when there is no server to talk to.
#[cfg(feature = "remote-sync")]
pub fn connect(server_url: Option<&str>) -> RemoteResult<Option<Arc<dyn RemoteStore>>> {
    let Some(url) = server_url else {
        tracing::info!("no room server configured; state stays on this device");
        return Ok(None);
    };
    let store = HttpRemoteStore::new(url)?;
    tracing::info!(url, "syncing room state with server");
    Ok(Some(Arc::new(store)))
}

/// Remote replica for `server_url`, or `None` when there is no server to talk to.
#[cfg(not(feature = "remote-sync"))]
pub fn connect(server_url: Option<&str>) -> RemoteResult<Option<Arc<dyn RemoteStore>>> {
    if let Some(url) = server_url {
        tracing::warn!(url, "built without remote-sync; ignoring room server");
    }
    Ok(None)
}

#[cfg(feature = "remote-sync")]
mod http {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use reqwest::{Client, Method, StatusCode};
    use tracing::{debug, warn};

    use crate::{
        state::{game::GameState, room::RoomCode},
        sync::error::{RemoteError, RemoteResult},
    };

    use super::RemoteStore;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// [`RemoteStore`] speaking JSON over HTTP to the room server.
    #[derive(Clone)]
    pub struct HttpRemoteStore {
        client: Client,
        base_url: Arc<str>,
    }

    impl HttpRemoteStore {
        /// Build a client for the server at `base_url` (e.g. `http://localhost:8080`).
        pub fn new(base_url: &str) -> RemoteResult<Self> {
            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|source| RemoteError::ClientBuilder {
                    source: Box::new(source),
                })?;

            Ok(Self {
                client,
                base_url: Arc::from(base_url.trim_end_matches('/')),
            })
        }

        fn state_url(&self, room: &RoomCode) -> String {
            format!("{}/api/rooms/{}/state", self.base_url, room)
        }

        fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
            self.client.request(method, url)
        }
    }

    impl RemoteStore for HttpRemoteStore {
        fn push_state(
            &self,
            room: RoomCode,
            state: GameState,
        ) -> BoxFuture<'static, RemoteResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let url = store.state_url(&room);
                let response = store
                    .request(Method::POST, &url)
                    .json(&state)
                    .send()
                    .await
                    .map_err(|source| RemoteError::RequestSend {
                        url: url.clone(),
                        source: Box::new(source),
                    })?;

                // Any completed exchange counts as delivered; the body is ignored.
                if response.status().is_success() {
                    debug!(room = %room, revision = state.revision, "pushed game state");
                } else {
                    warn!(
                        room = %room,
                        status = %response.status(),
                        "room server answered push with non-success status"
                    );
                }
                Ok(())
            })
        }

        fn fetch_state(&self, room: RoomCode) -> BoxFuture<'static, RemoteResult<GameState>> {
            let store = self.clone();
            Box::pin(async move {
                let url = store.state_url(&room);
                let response = store
                    .request(Method::GET, &url)
                    .send()
                    .await
                    .map_err(|source| RemoteError::RequestSend {
                        url: url.clone(),
                        source: Box::new(source),
                    })?;

                match response.status() {
                    status if status.is_success() => {
                        response.json::<GameState>().await.map_err(|source| {
                            RemoteError::DecodeResponse {
                                url,
                                source: Box::new(source),
                            }
                        })
                    }
                    other => Err(RemoteError::RequestStatus {
                        url,
                        status: other.as_u16(),
                    }),
                }
            })
        }

        fn delete_state(&self, room: RoomCode) -> BoxFuture<'static, RemoteResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let url = store.state_url(&room);
                let response = store
                    .request(Method::DELETE, &url)
                    .send()
                    .await
                    .map_err(|source| RemoteError::RequestSend {
                        url: url.clone(),
                        source: Box::new(source),
                    })?;

                match response.status() {
                    StatusCode::NOT_FOUND => Ok(()),
                    status if status.is_success() => Ok(()),
                    other => Err(RemoteError::RequestStatus {
                        url,
                        status: other.as_u16(),
                    }),
                }
            })
        }
    }
}

#[cfg(all(test, feature = "remote-sync"))]
mod tests {
    use std::{net::SocketAddr, sync::Arc};

    use tokio::net::TcpListener;

    use super::*;
    use crate::{dao::room_store::MemoryRoomStore, routes, state::AppState};

    async fn serve() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::router(AppState::new(Arc::new(MemoryRoomStore::new())), None);
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn http_store_talks_to_room_server() {
        let addr = serve().await;
        let remote = HttpRemoteStore::new(&format!("http://{addr}/")).unwrap();
        let room = RoomCode::parse("HTTP1").unwrap();
        let state = GameState {
            strikes: 2,
            score_b: 25,
            revision: 9,
            ..GameState::default()
        };

        let missing = remote.fetch_state(room.clone()).await.unwrap_err();
        assert!(missing.is_not_found());

        remote.push_state(room.clone(), state.clone()).await.unwrap();
        assert_eq!(remote.fetch_state(room.clone()).await.unwrap(), state);

        remote.delete_state(room.clone()).await.unwrap();
        remote.delete_state(room.clone()).await.unwrap();
        assert!(remote.fetch_state(room).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote = HttpRemoteStore::new(&format!("http://{addr}")).unwrap();
        let err = remote
            .push_state(RoomCode::parse("HTTP2").unwrap(), GameState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::sync::RemoteError::RequestSend { .. }));
    }

    #[test]
    fn no_url_means_no_remote() {
        assert!(connect(None).unwrap().is_none());
    }
}
