//! Invariants checked over random play

use balloon_shooter::consts::SIM_DT;
use balloon_shooter::sim::{
    ArenaKind, Bounds, Game, GameEvent, InputEvent, Key, Phase, Ray, Timers, TargetPopulation,
    TickInput, WeaponConfig, WeaponKind, collect_hits, resolve_shot,
};
use balloon_shooter::tuning::{MAX_ROUND_SECONDS, SpawnTuning};
use balloon_shooter::Tuning;
use glam::{Quat, Vec3};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Tick(u8),
    Fire,
    Key(Key, bool),
    Look(f32, f32),
    Escape,
    CaptureLost,
    CaptureAcquired,
    CaptureFailed,
    Pause,
    Resume,
    Restart,
    ChangeWeapon,
    ChangeMap,
    Quit,
    ForceGameOver,
    StartGame,
    SelectWeapon(WeaponKind),
    SelectArena(ArenaKind),
}

fn key() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::Forward),
        Just(Key::Back),
        Just(Key::Left),
        Just(Key::Right),
        Just(Key::Sprint),
        Just(Key::Jump),
    ]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        8 => (1u8..120).prop_map(Action::Tick),
        4 => Just(Action::Fire),
        3 => (key(), any::<bool>()).prop_map(|(k, down)| Action::Key(k, down)),
        2 => (-3.0f32..3.0, -1.5f32..1.5).prop_map(|(yaw, pitch)| Action::Look(yaw, pitch)),
        1 => Just(Action::Escape),
        1 => Just(Action::CaptureLost),
        2 => Just(Action::CaptureAcquired),
        1 => Just(Action::CaptureFailed),
        1 => Just(Action::Pause),
        1 => Just(Action::Resume),
        1 => Just(Action::Restart),
        1 => Just(Action::ChangeWeapon),
        1 => Just(Action::ChangeMap),
        1 => Just(Action::Quit),
        1 => Just(Action::ForceGameOver),
        2 => Just(Action::StartGame),
        2 => prop::sample::select(WeaponKind::ALL.to_vec()).prop_map(Action::SelectWeapon),
        2 => prop::sample::select(ArenaKind::ALL.to_vec()).prop_map(Action::SelectArena),
    ]
}

fn event_for(action: &Action) -> Option<InputEvent> {
    match action {
        Action::Fire => Some(InputEvent::FireDown),
        Action::Key(k, true) => Some(InputEvent::KeyDown(*k)),
        Action::Key(k, false) => Some(InputEvent::KeyUp(*k)),
        Action::Escape => Some(InputEvent::EscapePressed),
        Action::CaptureLost => Some(InputEvent::CaptureLost),
        Action::CaptureAcquired => Some(InputEvent::CaptureAcquired),
        Action::CaptureFailed => Some(InputEvent::CaptureFailed),
        _ => None,
    }
}

fn apply(game: &mut Game, input: &mut TickInput, action: &Action) {
    if let Some(event) = event_for(action) {
        game.handle_event(event);
        return;
    }
    // Illegal menu actions are expected to be rejected, not to panic
    let _ = match action {
        Action::Tick(n) => {
            for _ in 0..*n {
                game.tick(SIM_DT, input);
            }
            Ok(())
        }
        Action::Look(yaw, pitch) => {
            input.camera_rotation = Quat::from_euler(glam::EulerRot::YXZ, *yaw, *pitch, 0.0);
            Ok(())
        }
        Action::Pause => game.pause(),
        Action::Resume => game.resume(),
        Action::Restart => game.restart(),
        Action::ChangeWeapon => game.change_weapon(),
        Action::ChangeMap => game.change_map(),
        Action::Quit => game.quit(),
        Action::ForceGameOver => game.force_game_over(),
        Action::StartGame => game.start_game(),
        Action::SelectWeapon(kind) => game.select_weapon(*kind),
        Action::SelectArena(arena) => game.select_arena(*arena),
        _ => Ok(()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_length_is_capped(round_seconds in 0u32..200) {
        let json = format!(r#"{{ "session": {{ "round_seconds": {round_seconds} }} }}"#);
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                prop_assert!((1..=MAX_ROUND_SECONDS).contains(&tuning.session.round_seconds));
                let mut game = Game::headless(tuning, 1);
                game.start_game().unwrap();
                game.select_weapon(WeaponKind::Pistol).unwrap();
                game.select_arena(ArenaKind::Desert).unwrap();
                prop_assert!(game.session().time_remaining() <= MAX_ROUND_SECONDS);
            }
            Err(_) => prop_assert!(round_seconds == 0 || round_seconds > MAX_ROUND_SECONDS),
        }
    }

    #[test]
    fn session_invariants_hold(seed in any::<u64>(), actions in prop::collection::vec(action(), 1..80)) {
        let mut game = Game::headless(Tuning::default(), seed);
        let mut input = TickInput::default();
        let mut last_score = 0;

        for action in &actions {
            let phase_before = game.phase();
            apply(&mut game, &mut input, action);

            let session = game.session();
            prop_assert!(session.time_remaining() <= game.tuning().session.round_seconds);

            // Score only resets on the phase edges that start over
            if session.score() < last_score {
                prop_assert_ne!(phase_before, game.phase());
            }
            last_score = session.score();

            for event in game.drain_events() {
                if let GameEvent::PhaseChanged { from, to } = event {
                    prop_assert!(from.can_transition(to), "{:?} -> {:?}", from, to);
                }
            }

            let bounds = game.population().bounds();
            for target in game.population().targets() {
                prop_assert!(bounds.contains(target.position));
            }
            prop_assert!(game.population().len() <= game.tuning().spawning.max_live);

            if game.phase() != Phase::Playing {
                prop_assert!(game.timers().is_empty() || game.phase() == Phase::Paused);
            }
        }
    }

    #[test]
    fn balloons_never_leave_bounds(seed in any::<u64>(), ticks in 1usize..2000) {
        let mut population = TargetPopulation::new(Bounds::standard(), SpawnTuning::default(), seed);
        population.populate_initial();
        for _ in 0..5 {
            population.spawn_edge();
        }
        for _ in 0..ticks {
            population.update();
        }
        for target in population.targets() {
            prop_assert!(population.bounds().contains(target.position));
        }
    }

    #[test]
    fn each_balloon_counts_once_per_shot(
        seed in any::<u64>(),
        yaw in -3.1f32..3.1,
        pitch in -0.2f32..0.8,
        copies in 1usize..5,
    ) {
        let mut population = TargetPopulation::new(Bounds::standard(), SpawnTuning::default(), seed);
        population.populate_initial();

        let direction = Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, 0.0) * Vec3::NEG_Z;
        let ray = Ray::new(Vec3::new(0.0, 1.6, 0.0), direction);
        let rays = vec![ray; copies];

        let hits = collect_hits(&rays, population.targets());
        let mut ids: Vec<_> = hits.iter().map(|h| h.target).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), hits.len());
        for pair in hits.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn penetration_never_exceeds_cap(
        seed in any::<u64>(),
        count in 1usize..20,
        max_penetration in 1u32..5,
        spacing in 2.5f32..6.0,
    ) {
        let mut population = TargetPopulation::new(Bounds::standard(), SpawnTuning::default(), seed);
        let origin = Vec3::new(0.0, 5.0, 0.0);
        for i in 0..count {
            population.spawn_at(origin + Vec3::NEG_Z * spacing * (i as f32 + 1.0), Vec3::ZERO);
        }
        let live = population.len();

        let mut config = WeaponConfig::for_kind(WeaponKind::Sniper);
        config.max_penetration = max_penetration;
        let tuning = Tuning::default();
        let mut timers = Timers::new();

        let outcome = resolve_shot(
            &[Ray::new(origin, Vec3::NEG_Z)],
            &mut population,
            &config,
            &tuning,
            &mut timers,
        );
        let expected = live.min(max_penetration as usize);
        prop_assert_eq!(outcome.popped.len(), expected);
        prop_assert_eq!(population.len(), live - expected);
        let base = config.points_for(tuning.score.base_score) * expected as u64;
        let bonus = (expected as u64 - 1) * tuning.score.penetration_bonus_per_extra as u64;
        prop_assert_eq!(outcome.points(), base + bonus);
    }
}
