/// 실시간 알림 레이어
/// 작품 id별 룸 하나. 브로드캐스트는 fire-and-forget이며,
/// 구독자가 없거나 전송이 실패해도 호출자에게는 절대 전파하지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Realtime Hub

// 룸당 송신 버퍼. 느린 구독자는 밀린 만큼 이벤트를 잃는다(Lagged).
const ROOM_CAPACITY: usize = 64;

/// 작품별 브로드캐스트 룸 허브
pub struct RealtimeHub {
    rooms: RwLock<HashMap<i64, broadcast::Sender<AuctionEvent>>>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        RealtimeHub {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// 룸 획득 (없으면 생성)
    fn room(&self, artwork_id: i64) -> broadcast::Sender<AuctionEvent> {
        if let Some(sender) = self.rooms.read().unwrap().get(&artwork_id) {
            return sender.clone();
        }
        let mut rooms = self.rooms.write().unwrap();
        rooms
            .entry(artwork_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }

    /// 룸 구독
    pub fn subscribe(&self, artwork_id: i64) -> broadcast::Receiver<AuctionEvent> {
        self.room(artwork_id).subscribe()
    }

    /// 이벤트 브로드캐스트. 실패는 로그만 남기고 버린다.
    pub fn broadcast(&self, event: AuctionEvent) {
        let artwork_id = event.artwork_id();
        let sender = self.room(artwork_id);
        match sender.send(event) {
            Ok(receivers) => {
                debug!(
                    "{:<12} --> 이벤트 발행: artwork_id={}, 구독자 {}명",
                    "Realtime", artwork_id, receivers
                );
            }
            Err(_) => {
                // 구독자가 없는 룸. 정상 상황이다.
                debug!(
                    "{:<12} --> 구독자 없는 룸으로의 발행 생략: artwork_id={}",
                    "Realtime", artwork_id
                );
            }
        }
    }
}

// endregion: --- Realtime Hub

// region:    --- WebSocket Protocol

/// 클라이언트 → 서버 메시지
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinArtwork { artwork_id: i64 },
    LeaveArtwork { artwork_id: i64 },
    Ping,
}

/// 서버 → 클라이언트 제어 메시지 (경매 이벤트는 AuctionEvent 그대로 전송)
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined { artwork_id: i64 },
    Left { artwork_id: i64 },
    Pong,
    Error { code: String, message: String },
}

// endregion: --- WebSocket Protocol

// region:    --- WebSocket Connection

/// WebSocket 연결 처리
///
/// 룸 join마다 포워딩 태스크 하나를 띄워 브로드캐스트 수신분을
/// 연결별 mpsc 채널로 모은다. leave/종료 시 태스크를 정리한다.
pub async fn handle_socket(socket: WebSocket, hub: std::sync::Arc<RealtimeHub>) {
    let (mut sender, mut receiver) = socket.split();
    let (forward_tx, mut forward_rx) = mpsc::channel::<String>(ROOM_CAPACITY);
    let mut joined: HashMap<i64, tokio::task::JoinHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            // 클라이언트 메시지 처리
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_message(&text, &hub, &forward_tx, &mut joined);
                        if let Ok(json) = serde_json::to_string(&reply) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        // 종료 핸드셰이크 없는 연결 리셋은 흔한 일이다
                        warn!("{:<12} --> WebSocket 연결 끊김: {}", "Realtime", e);
                        break;
                    }
                    _ => {}
                }
            }

            // 룸 이벤트 포워딩
            event = forward_rx.recv() => {
                match event {
                    Some(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    for (_, handle) in joined.drain() {
        handle.abort();
    }
    info!("{:<12} --> WebSocket 연결 종료", "Realtime");
}

/// 클라이언트 메시지 한 건 처리
fn handle_client_message(
    text: &str,
    hub: &std::sync::Arc<RealtimeHub>,
    forward_tx: &mpsc::Sender<String>,
    joined: &mut HashMap<i64, tokio::task::JoinHandle<()>>,
) -> ServerMessage {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::Error {
                code: "INVALID_MESSAGE".to_string(),
                message: format!("메시지를 해석할 수 없습니다: {}", e),
            }
        }
    };

    match client_msg {
        ClientMessage::JoinArtwork { artwork_id } => {
            if !joined.contains_key(&artwork_id) {
                let mut room_rx = hub.subscribe(artwork_id);
                let tx = forward_tx.clone();
                let handle = tokio::spawn(async move {
                    loop {
                        match room_rx.recv().await {
                            Ok(event) => {
                                let Ok(json) = serde_json::to_string(&event) else {
                                    continue;
                                };
                                if tx.send(json).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                warn!(
                                    "{:<12} --> 구독 지연으로 이벤트 {}건 유실: artwork_id={}",
                                    "Realtime", n, artwork_id
                                );
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                });
                joined.insert(artwork_id, handle);
            }
            info!(
                "{:<12} --> 룸 입장: artwork_id={} (구독 룸 {}개)",
                "Realtime",
                artwork_id,
                joined.len()
            );
            ServerMessage::Joined { artwork_id }
        }
        ClientMessage::LeaveArtwork { artwork_id } => {
            if let Some(handle) = joined.remove(&artwork_id) {
                handle.abort();
            }
            ServerMessage::Left { artwork_id }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}

// endregion: --- WebSocket Connection

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::AuctionEvent;

    #[tokio::test]
    async fn test_subscriber_receives_room_event() {
        let hub = RealtimeHub::new();
        let mut rx = hub.subscribe(1);

        hub.broadcast(AuctionEvent::PaymentRequired {
            artwork_id: 1,
            bid_id: 5,
            winning_bid: 150.0,
            winner_id: 2,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.artwork_id(), 1);
    }

    #[tokio::test]
    async fn test_rooms_are_isolated_per_artwork() {
        let hub = RealtimeHub::new();
        let mut rx_other = hub.subscribe(2);

        hub.broadcast(AuctionEvent::PaymentCompleted {
            artwork_id: 1,
            payment_id: 9,
            status: "SOLD".to_string(),
        });

        // 다른 작품 룸에는 도달하지 않는다
        assert!(matches!(
            rx_other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_panic() {
        let hub = RealtimeHub::new();
        hub.broadcast(AuctionEvent::PaymentFailed {
            artwork_id: 42,
            payment_id: 1,
            reason: "card_declined".to_string(),
        });
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "join_artwork", "artwork_id": 3}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinArtwork { artwork_id: 3 }));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "shout"}"#).is_err());
    }
}

// endregion: --- Tests
