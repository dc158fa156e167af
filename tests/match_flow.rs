//! End-to-end match scenarios driven through the match state

use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

use tiny_space_battles::config::GameConfig;
use tiny_space_battles::game::MatchState;
use tiny_space_battles::matchmaking::{Participant, ParticipantId};
use tiny_space_battles::ws::protocol::{
    ClientMsg, InitSlot, Pose, ProtocolError, ServerMsg, Slot,
};

/// P1's bullet needs this many ticks to reach P2's spawn hit box
const TICKS_TO_REACH_P2: usize = 142;

struct TestClient {
    id: ParticipantId,
    rx: UnboundedReceiver<ServerMsg>,
}

impl TestClient {
    fn join(state: &mut MatchState) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state
            .connect(Participant::new(id, tx, &GameConfig::default()))
            .unwrap();
        Self { id, rx }
    }

    fn drain(&mut self) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

fn deaths(msgs: &[ServerMsg]) -> Vec<Slot> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMsg::Death { slot } => Some(*slot),
            _ => None,
        })
        .collect()
}

fn last_bullets(msgs: &[ServerMsg]) -> Option<&ServerMsg> {
    msgs.iter()
        .rev()
        .find(|m| matches!(m, ServerMsg::Bullets { .. }))
}

fn paired() -> (MatchState, TestClient, TestClient) {
    let mut state = MatchState::new(GameConfig::default());
    let mut p1 = TestClient::join(&mut state);
    let mut p2 = TestClient::join(&mut state);
    p1.drain();
    p2.drain();
    (state, p1, p2)
}

#[test]
fn first_connect_gets_p1_and_waits() {
    let mut state = MatchState::new(GameConfig::default());
    let mut p1 = TestClient::join(&mut state);

    assert_eq!(p1.drain(), vec![ServerMsg::Init { slot: InitSlot::P1 }]);
    assert!(!state.is_ready());

    state.tick();
    assert!(p1.drain().is_empty());
}

#[test]
fn second_connect_readies_both_and_seeds_poses() {
    let mut state = MatchState::new(GameConfig::default());
    let mut p1 = TestClient::join(&mut state);
    p1.drain();
    let mut p2 = TestClient::join(&mut state);

    let to_p1 = p1.drain();
    let to_p2 = p2.drain();
    assert_eq!(to_p2[0], ServerMsg::Init { slot: InitSlot::P2 });
    assert!(to_p1.contains(&ServerMsg::Ready));
    assert!(to_p2.contains(&ServerMsg::Ready));
    assert!(to_p1
        .iter()
        .any(|m| matches!(m, ServerMsg::Move { slot: Slot::P2, .. })));
    assert!(to_p2
        .iter()
        .any(|m| matches!(m, ServerMsg::Move { slot: Slot::P1, .. })));
    assert!(state.is_ready());
}

#[test]
fn fired_bullet_advances_by_its_velocity_every_tick() {
    let (mut state, mut p1, _p2) = paired();

    state.handle_message(p1.id, ClientMsg::Fire).unwrap();
    for _ in 0..10 {
        state.tick();
    }

    let msgs = p1.drain();
    match last_bullets(&msgs) {
        Some(ServerMsg::Bullets { bullets, .. }) => {
            assert_eq!(bullets.len(), 1);
            assert_eq!(bullets[0].owner, Slot::P1);
            assert!((bullets[0].x - (140.0 + 50.0)).abs() < 1e-3);
            assert!((bullets[0].y - 348.5).abs() < 1e-3);
        }
        other => panic!("expected a bullets update, got {other:?}"),
    }
}

#[test]
fn killing_blow_emits_one_death_and_freezes_combat() {
    let (mut state, mut p1, mut p2) = paired();
    let config = GameConfig::default();
    let shots = (config.max_health / config.hit_damage + 1) as usize;

    for _ in 0..shots {
        state.handle_message(p1.id, ClientMsg::Fire).unwrap();
    }

    let mut last_p2_health = config.max_health;
    for _ in 0..TICKS_TO_REACH_P2 + 20 {
        state.tick();
        let health = state.ship(Slot::P2).unwrap().health;
        assert!(health <= last_p2_health, "health went up without a restart");
        last_p2_health = health;
    }

    assert_eq!(deaths(&p1.drain()), vec![Slot::P2]);
    assert_eq!(deaths(&p2.drain()), vec![Slot::P2]);
    assert!(state.is_game_over());
    assert!(!state.is_ready());

    for id in [p1.id, p2.id] {
        assert_eq!(
            state.handle_message(id, ClientMsg::Fire),
            Err(ProtocolError::NotReady("fire"))
        );
    }
    assert!(!state.combat().has_bullets());
    state.tick();
    assert!(p1.drain().is_empty());
    assert!(p2.drain().is_empty());
}

#[test]
fn simultaneous_kills_report_both_deaths_p1_first() {
    let (mut state, mut p1, mut p2) = paired();
    let config = GameConfig::default();
    let shots = (config.max_health / config.hit_damage + 1) as usize;

    // point blank: each muzzle sits next to the other ship
    state
        .handle_message(
            p2.id,
            ClientMsg::Move {
                slot: Slot::P2,
                position: Pose {
                    x: 150.0,
                    y: 312.5,
                    angle: 180.0,
                },
            },
        )
        .unwrap();
    for _ in 0..shots {
        state.handle_message(p1.id, ClientMsg::Fire).unwrap();
        state.handle_message(p2.id, ClientMsg::Fire).unwrap();
    }

    state.tick();

    assert_eq!(deaths(&p1.drain()), vec![Slot::P1, Slot::P2]);
    assert_eq!(deaths(&p2.drain()), vec![Slot::P1, Slot::P2]);
    assert!(state.is_game_over());

    state.tick();
    assert!(deaths(&p1.drain()).is_empty());
}

#[test]
fn restart_after_death_resets_the_round() {
    let (mut state, mut p1, mut p2) = paired();
    let config = GameConfig::default();
    let shots = (config.max_health / config.hit_damage + 1) as usize;
    for _ in 0..shots {
        state.handle_message(p1.id, ClientMsg::Fire).unwrap();
    }
    for _ in 0..TICKS_TO_REACH_P2 {
        state.tick();
    }
    assert!(state.is_game_over());
    p1.drain();
    p2.drain();

    state.handle_message(p2.id, ClientMsg::Restart).unwrap();

    for client in [&mut p1, &mut p2] {
        let msgs = client.drain();
        assert!(msgs.contains(&ServerMsg::Restart));
        assert!(msgs.contains(&ServerMsg::Bullets {
            bullets: vec![],
            p1_health: config.max_health,
            p2_health: config.max_health,
        }));
    }
    assert!(state.is_ready());
    assert!(!state.is_game_over());
    assert_eq!(state.ship(Slot::P2).unwrap().health, config.max_health);
    assert!(!state.combat().has_bullets());
}

#[test]
fn active_departure_promotes_the_queue_head() {
    let (mut state, p1, mut p2) = paired();
    let mut waiting = TestClient::join(&mut state);
    assert_eq!(
        waiting.drain(),
        vec![ServerMsg::Init {
            slot: InitSlot::Full
        }]
    );

    state.disconnect(p1.id).unwrap();

    let to_p2 = p2.drain();
    assert_eq!(to_p2[0], ServerMsg::PlayerLeft);
    assert!(to_p2.contains(&ServerMsg::Ready));

    let to_waiting = waiting.drain();
    assert_eq!(to_waiting[0], ServerMsg::Init { slot: InitSlot::P1 });
    assert!(to_waiting.contains(&ServerMsg::Ready));

    assert_eq!(state.registry().slot_of(waiting.id), Some(Slot::P1));
    assert_eq!(state.registry().waiting_count(), 0);
    assert!(state.is_ready());
}

#[test]
fn departure_without_queue_waits_for_a_new_opponent() {
    let (mut state, mut p1, p2) = paired();

    state.disconnect(p2.id).unwrap();

    assert_eq!(p1.drain(), vec![ServerMsg::PlayerLeft]);
    assert!(!state.is_ready());
    assert_eq!(
        state.handle_message(p1.id, ClientMsg::Fire),
        Err(ProtocolError::NotReady("fire"))
    );

    let mut p2 = TestClient::join(&mut state);
    assert_eq!(p2.drain()[0], ServerMsg::Init { slot: InitSlot::P2 });
    assert!(state.is_ready());
}
