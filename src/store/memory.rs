//! In-process room store

use super::{RoomPatch, RoomStore, StoreError, Subscribers, Subscription, LOG_TARGET};
use crate::room::{JoinOutcome, Player, Room, RoomCode, RoomSettings};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

/// Rooms kept in a map for the life of the process.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<RoomCode, Room>>,
    subscribers: Subscribers,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn create_room(
        &self,
        code: RoomCode,
        host: Player,
        settings: RoomSettings,
    ) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock();
        if rooms.contains_key(&code) {
            return Err(StoreError::AlreadyExists(code));
        }
        let room = Room::new(code.clone(), host, settings)?;
        rooms.insert(code, room.clone());
        info!(target: LOG_TARGET, room = %room.code(), "Room created");
        Ok(room)
    }

    fn join_room(&self, code: &RoomCode, player: Player) -> Result<JoinOutcome, StoreError> {
        let mut rooms = self.rooms.lock();
        let room = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let username = player.username().to_string();
        let outcome = room.admit(player)?;
        if outcome == JoinOutcome::Joined {
            info!(target: LOG_TARGET, room = %code, player = %username, "Player joined");
            self.subscribers.publish(room);
        }
        Ok(outcome)
    }

    fn subscribe(&self, code: &RoomCode) -> Result<Subscription, StoreError> {
        let rooms = self.rooms.lock();
        let room = rooms
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(self.subscribers.subscribe(room))
    }

    fn patch_room(&self, code: &RoomCode, patch: RoomPatch) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock();
        let room = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let next = patch.apply(room)?;
        *room = next.clone();
        self.subscribers.publish(&next);
        Ok(next)
    }

    fn load_room(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.lock().get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BingoError;
    use crate::room::RoomStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store_with_room(rng: &mut StdRng) -> (InMemoryRoomStore, RoomCode) {
        let store = InMemoryRoomStore::new();
        let code = RoomCode::generate(rng);
        store
            .create_room(code.clone(), Player::new("Host", rng), RoomSettings::default())
            .unwrap();
        (store, code)
    }

    #[test]
    fn test_create_and_load() {
        let mut rng = StdRng::seed_from_u64(1);
        let (store, code) = store_with_room(&mut rng);
        let room = store.load_room(&code).unwrap().unwrap();
        assert_eq!(room.status(), RoomStatus::Lobby);
        assert_eq!(store.room_count(), 1);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let (store, code) = store_with_room(&mut rng);
        let result = store.create_room(code, Player::new("Other", &mut rng), RoomSettings::default());
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn test_join_unknown_room() {
        let mut rng = StdRng::seed_from_u64(3);
        let store = InMemoryRoomStore::new();
        let code = RoomCode::generate(&mut rng);
        let result = store.join_room(&code, Player::new("Alice", &mut rng));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.load_room(&code).unwrap().is_none());
    }

    #[test]
    fn test_join_publishes_once() {
        let mut rng = StdRng::seed_from_u64(4);
        let (store, code) = store_with_room(&mut rng);
        let mut sub = store.subscribe(&code).unwrap();
        assert!(sub.try_recv().is_some());

        let alice = Player::new("Alice", &mut rng);
        assert_eq!(store.join_room(&code, alice.clone()).unwrap(), JoinOutcome::Joined);
        assert_eq!(store.join_room(&code, alice).unwrap(), JoinOutcome::Rejoined);

        let updates = sub.drain();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].players().len(), 2);
    }

    #[test]
    fn test_rejected_patch_leaves_room() {
        let mut rng = StdRng::seed_from_u64(5);
        let (store, code) = store_with_room(&mut rng);
        let before = store.load_room(&code).unwrap().unwrap();
        let mut sub = store.subscribe(&code).unwrap();
        sub.drain();

        let patch = RoomPatch {
            drawn_numbers: Some(vec![80]),
            ..RoomPatch::default()
        };
        let result = store.patch_room(&code, patch);
        assert!(matches!(
            result,
            Err(StoreError::Rejected(BingoError::Precondition(_)))
        ));
        assert_eq!(store.load_room(&code).unwrap().unwrap(), before);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_patch_status_publishes() {
        let mut rng = StdRng::seed_from_u64(6);
        let (store, code) = store_with_room(&mut rng);
        let mut sub = store.subscribe(&code).unwrap();
        store
            .patch_room(&code, RoomPatch::status(RoomStatus::Playing))
            .unwrap();
        assert_eq!(sub.latest().map(|r| r.status()), Some(RoomStatus::Playing));
    }
}
