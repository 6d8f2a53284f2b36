use std::{cell::Cell, rc::Rc};

use wave_director::{apply, query, Director};
use wave_director_core::{
    Command, ConfigurationError, DirectorConfig, EnemyHost, EnemyWeight, Event, GoalDefinition,
    GoalId, PathDefinition, PathId, Phase, Position, PrototypeId, SpawnRequest, UniformSource,
    WaveConfig, WaveCounters, WaveIndex, WinCause,
};
use wave_director_system_spawning::RngSource;

#[derive(Clone, Debug, PartialEq)]
struct Spawned {
    wave: WaveIndex,
    prototype: PrototypeId,
    path: PathId,
    goal: GoalId,
    position: Position,
}

#[derive(Debug, Default)]
struct RecordingHost {
    spawns: Vec<Spawned>,
    live: usize,
}

impl EnemyHost for RecordingHost {
    type Handle = usize;

    fn spawn(&mut self, request: &SpawnRequest<'_>) -> usize {
        self.spawns.push(Spawned {
            wave: request.wave,
            prototype: request.prototype.clone(),
            path: request.path.id,
            goal: request.goal,
            position: request.position,
        });
        self.live += 1;
        self.spawns.len() - 1
    }

    fn live_enemy_count(&self) -> usize {
        self.live
    }
}

fn wave(start_delay: f64, enemy_count: u32, mean_spawn_interval: f64) -> WaveConfig {
    WaveConfig {
        start_delay,
        enemy_count,
        mean_spawn_interval,
        spawn_variance: 0.0,
        enemies: vec![EnemyWeight::new(PrototypeId::new("grunt"), 1.0)],
    }
}

fn config(waves: Vec<WaveConfig>) -> DirectorConfig {
    DirectorConfig {
        waves,
        paths: vec![PathDefinition {
            id: PathId::new(0),
            goal: GoalId::new(1),
            waypoints: vec![Position::new(2.0, 3.0, 0.0), Position::new(8.0, 3.0, 0.0)],
        }],
        goals: vec![GoalDefinition {
            id: GoalId::new(1),
            name: "keep".to_owned(),
        }],
    }
}

fn director(waves: Vec<WaveConfig>) -> Director<impl UniformSource> {
    Director::new(config(waves), RngSource::seeded(7), 0.0).expect("valid configuration")
}

fn tick_all<R: UniformSource>(
    director: &mut Director<R>,
    host: &mut RecordingHost,
    times: &[f64],
) -> Vec<Event> {
    let mut events = Vec::new();
    for &now in times {
        director.tick(now, host, &mut events).expect("tick");
    }
    events
}

fn phase_changes(events: &[Event]) -> Vec<(Phase, Phase)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PhaseChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn wins(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::GameWon { .. }))
        .count()
}

#[test]
fn malformed_configuration_is_rejected_up_front() {
    let result = Director::new(config(Vec::new()), RngSource::seeded(1), 0.0);
    assert_eq!(result.err(), Some(ConfigurationError::NoWaves));
}

#[test]
fn pre_wave_holds_until_start_delay_elapses() {
    let mut director = director(vec![wave(5.0, 3, 1.0)]);
    let mut host = RecordingHost::default();

    let events = tick_all(
        &mut director,
        &mut host,
        &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
    );
    assert!(events.is_empty());
    assert!(host.spawns.is_empty());
    assert_eq!(query::phase(&director), Phase::PreWave);
    assert_eq!(query::counters(&director), WaveCounters::default());

    let events = tick_all(&mut director, &mut host, &[5.25]);
    assert_eq!(
        events,
        vec![Event::PhaseChanged {
            from: Phase::PreWave,
            to: Phase::WaveActive,
            wave: WaveIndex::FIRST,
        }]
    );
    assert!(host.spawns.is_empty(), "the transition tick runs no spawn action");

    let events = tick_all(&mut director, &mut host, &[5.5]);
    assert!(phase_changes(&events).is_empty());
    assert_eq!(host.spawns.len(), 1);
}

#[test]
fn spawns_start_on_the_first_waypoint_of_the_chosen_path() {
    let mut director = director(vec![wave(0.0, 2, 1.0)]);
    let mut host = RecordingHost::default();

    let events = tick_all(&mut director, &mut host, &[0.25, 0.5]);
    assert_eq!(
        host.spawns,
        vec![Spawned {
            wave: WaveIndex::FIRST,
            prototype: PrototypeId::new("grunt"),
            path: PathId::new(0),
            goal: GoalId::new(1),
            position: Position::new(2.0, 3.0, 0.0),
        }]
    );
    assert!(events.contains(&Event::EnemySpawned {
        wave: WaveIndex::FIRST,
        prototype: PrototypeId::new("grunt"),
        path: PathId::new(0),
        goal: GoalId::new(1),
    }));
}

#[test]
fn spawn_gate_paces_emission_by_sampled_delay() {
    let mut director = director(vec![wave(0.0, 3, 1.0)]);
    let mut host = RecordingHost::default();

    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5]);
    assert_eq!(host.spawns.len(), 1);

    let _ = tick_all(&mut director, &mut host, &[0.75, 1.0, 1.25]);
    assert_eq!(host.spawns.len(), 1);

    let _ = tick_all(&mut director, &mut host, &[1.5]);
    assert_eq!(host.spawns.len(), 2);
    let snapshot = query::snapshot(&director);
    assert!((snapshot.last_spawn_attempt - 1.5).abs() < f64::EPSILON);
    assert!((snapshot.next_spawn_delay - 1.0).abs() < f64::EPSILON);
}

#[test]
fn exhausted_wave_advances_and_resets_counters() {
    let mut director = director(vec![wave(0.0, 2, 1.0), wave(3.0, 1, 1.0)]);
    let mut host = RecordingHost::default();

    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5, 1.0, 2.0]);
    assert_eq!(query::phase(&director), Phase::SpawnComplete);
    assert_eq!(query::counters(&director).spawned, 2);

    let mut events = Vec::new();
    director.on_enemy_died(&mut events);
    director.on_enemy_reached_goal(&mut events);
    assert!(events.is_empty());

    let events = tick_all(&mut director, &mut host, &[2.5]);
    assert_eq!(
        phase_changes(&events),
        vec![(Phase::SpawnComplete, Phase::WaveComplete)]
    );

    let events = tick_all(&mut director, &mut host, &[3.0]);
    let second = WaveIndex::new(1);
    assert_eq!(
        events,
        vec![
            Event::WaveAdvanced { wave: second },
            Event::PhaseChanged {
                from: Phase::WaveComplete,
                to: Phase::PreWave,
                wave: second,
            },
        ]
    );

    let snapshot = query::snapshot(&director);
    assert_eq!(snapshot.wave, second);
    assert_eq!(snapshot.counters, WaveCounters::default());
    assert!((snapshot.wave_started_at - 3.0).abs() < f64::EPSILON);
    assert!((snapshot.last_spawn_attempt - 3.0).abs() < f64::EPSILON);

    let _ = tick_all(&mut director, &mut host, &[5.0]);
    assert_eq!(query::phase(&director), Phase::PreWave);

    let _ = tick_all(&mut director, &mut host, &[6.5, 7.0]);
    assert_eq!(query::phase(&director), Phase::SpawnComplete);
    assert_eq!(host.spawns.last().map(|spawn| spawn.wave), Some(second));
}

#[test]
fn zero_start_delay_still_takes_one_transition_per_tick() {
    let mut director = director(vec![wave(0.0, 1, 0.5), wave(0.0, 1, 0.5)]);
    let mut host = RecordingHost::default();

    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5]);
    director.on_enemy_died(&mut Vec::new());
    let _ = tick_all(&mut director, &mut host, &[1.0]);
    assert_eq!(query::phase(&director), Phase::WaveComplete);

    let events = tick_all(&mut director, &mut host, &[1.5, 1.5]);
    assert_eq!(
        phase_changes(&events),
        vec![(Phase::WaveComplete, Phase::PreWave)]
    );
    assert_eq!(query::phase(&director), Phase::PreWave);

    let events = tick_all(&mut director, &mut host, &[1.75]);
    assert_eq!(
        phase_changes(&events),
        vec![(Phase::PreWave, Phase::WaveActive)]
    );
    assert_eq!(host.spawns.len(), 1);

    // The delay drawn after the previous wave's last spawn still gates this one.
    let _ = tick_all(&mut director, &mut host, &[1.9]);
    assert_eq!(host.spawns.len(), 1);
    let _ = tick_all(&mut director, &mut host, &[2.0]);
    assert_eq!(host.spawns.len(), 2);
}

#[test]
fn final_wave_wins_once_the_field_is_clear() {
    let mut director = director(vec![wave(0.0, 1, 1.0)]);
    let mut host = RecordingHost::default();
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let _ = director.subscribe_win(move |cause| {
        assert_eq!(cause, WinCause::AllEnemiesCleared);
        seen.set(seen.get() + 1);
    });

    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5]);
    director.on_enemy_died(&mut Vec::new());
    let events = tick_all(&mut director, &mut host, &[1.0]);
    assert_eq!(
        phase_changes(&events),
        vec![(Phase::SpawnComplete, Phase::GameOver)]
    );

    let events = tick_all(&mut director, &mut host, &[1.5, 2.0]);
    assert_eq!(wins(&events), 0, "a live enemy blocks the win");
    assert!(!query::has_won(&director));

    host.live = 0;
    let events = tick_all(&mut director, &mut host, &[2.5, 3.0, 3.5]);
    assert_eq!(
        events,
        vec![Event::GameWon {
            cause: WinCause::AllEnemiesCleared,
        }]
    );
    assert_eq!(calls.get(), 1);
    assert!(query::has_won(&director));
    assert_eq!(query::phase(&director), Phase::GameOver);
}

#[test]
fn mixed_outcomes_resolve_the_wave() {
    let mut director = director(vec![wave(0.0, 5, 0.5)]);
    let mut host = RecordingHost::default();

    let _ = tick_all(&mut director, &mut host, &[0.25, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(host.spawns.len(), 5);
    assert_eq!(query::phase(&director), Phase::SpawnComplete);

    let mut events = Vec::new();
    for _ in 0..3 {
        director.on_enemy_died(&mut events);
    }
    director.on_enemy_reached_goal(&mut events);
    let _ = tick_all(&mut director, &mut host, &[5.5]);
    assert_eq!(query::phase(&director), Phase::SpawnComplete);

    director.on_enemy_reached_goal(&mut events);
    let _ = tick_all(&mut director, &mut host, &[6.0]);
    assert_eq!(query::phase(&director), Phase::GameOver);
    assert_eq!(
        query::counters(&director),
        WaveCounters {
            spawned: 5,
            dead: 3,
            reached_goal: 2,
        }
    );
    assert!(events.is_empty());
}

#[test]
fn empty_wave_completes_without_spawning() {
    let mut director = director(vec![wave(0.0, 0, 1.0)]);
    let mut host = RecordingHost::default();

    let events = tick_all(&mut director, &mut host, &[0.25, 0.5, 0.75, 1.0]);
    assert!(host.spawns.is_empty());
    assert_eq!(
        phase_changes(&events),
        vec![
            (Phase::PreWave, Phase::WaveActive),
            (Phase::WaveActive, Phase::SpawnComplete),
            (Phase::SpawnComplete, Phase::GameOver),
        ]
    );
    assert_eq!(wins(&events), 1);
}

#[test]
fn manual_override_fires_regardless_of_phase() {
    let mut director = director(vec![wave(0.0, 1, 1.0)]);
    let mut host = RecordingHost::default();
    let causes = Rc::new(Cell::new(0));
    let seen = Rc::clone(&causes);
    let _ = director.subscribe_win(move |cause| {
        assert_eq!(cause, WinCause::ManualOverride);
        seen.set(seen.get() + 1);
    });

    let mut events = Vec::new();
    director.force_win(&mut events);
    assert_eq!(query::phase(&director), Phase::PreWave);
    assert_eq!(
        events,
        vec![Event::GameWon {
            cause: WinCause::ManualOverride,
        }]
    );
    assert!(query::has_won(&director));

    director.force_win(&mut events);
    assert_eq!(causes.get(), 2);

    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5]);
    director.on_enemy_died(&mut Vec::new());
    host.live = 0;
    let events = tick_all(&mut director, &mut host, &[1.0, 1.5]);
    assert_eq!(query::phase(&director), Phase::GameOver);
    assert_eq!(wins(&events), 0, "natural win stays latched after an override");
    assert_eq!(causes.get(), 2);
}

#[test]
fn over_resolution_is_reported_without_halting() {
    let mut director = director(vec![wave(0.0, 1, 1.0)]);
    let mut host = RecordingHost::default();
    let _ = tick_all(&mut director, &mut host, &[0.25, 0.5]);

    let mut events = Vec::new();
    director.on_enemy_died(&mut events);
    assert!(events.is_empty());
    director.on_enemy_reached_goal(&mut events);
    assert_eq!(
        events,
        vec![Event::ResolutionOverflow {
            wave: WaveIndex::FIRST,
            resolved: 2,
            enemy_count: 1,
        }]
    );

    let _ = tick_all(&mut director, &mut host, &[1.0]);
    assert_eq!(query::phase(&director), Phase::GameOver);
}

#[test]
fn apply_routes_commands_to_the_director() {
    let mut director = director(vec![wave(0.0, 1, 1.0)]);
    let mut host = RecordingHost::default();
    let mut events = Vec::new();

    for command in [
        Command::Tick { now: 0.25 },
        Command::Tick { now: 0.5 },
        Command::EnemyReachedGoal,
        Command::Tick { now: 1.0 },
        Command::ForceWin,
    ] {
        apply(&mut director, command, &mut host, &mut events).expect("apply");
    }

    assert_eq!(query::phase(&director), Phase::GameOver);
    assert_eq!(query::counters(&director).reached_goal, 1);
    assert_eq!(
        events.last(),
        Some(&Event::GameWon {
            cause: WinCause::ManualOverride,
        })
    );
}

#[test]
fn unsubscribed_listener_is_not_notified() {
    let mut director = director(vec![wave(0.0, 1, 1.0)]);
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let id = director.subscribe_win(move |_| seen.set(seen.get() + 1));

    assert!(director.unsubscribe_win(id));
    assert!(!director.unsubscribe_win(id));
    director.force_win(&mut Vec::new());
    assert_eq!(calls.get(), 0);
}

#[test]
fn dropping_the_director_releases_listeners() {
    let calls = Rc::new(Cell::new(0));
    {
        let mut director = director(vec![wave(0.0, 1, 1.0)]);
        let seen = Rc::clone(&calls);
        let _ = director.subscribe_win(move |_| seen.set(seen.get() + 1));
        assert_eq!(Rc::strong_count(&calls), 2);
    }
    assert_eq!(Rc::strong_count(&calls), 1);
}

fn replay(seed: u64) -> (Vec<Event>, Vec<Spawned>) {
    let config = DirectorConfig {
        waves: vec![
            WaveConfig {
                start_delay: 1.0,
                enemy_count: 12,
                mean_spawn_interval: 0.8,
                spawn_variance: 0.5,
                enemies: vec![
                    EnemyWeight::new(PrototypeId::new("grunt"), 3.0),
                    EnemyWeight::new(PrototypeId::new("runner"), 1.0),
                    EnemyWeight::new(PrototypeId::new("brute"), 0.5),
                ],
            },
            WaveConfig {
                start_delay: 2.0,
                enemy_count: 8,
                mean_spawn_interval: 0.5,
                spawn_variance: 0.25,
                enemies: vec![EnemyWeight::new(PrototypeId::new("runner"), 1.0)],
            },
        ],
        paths: vec![
            PathDefinition {
                id: PathId::new(0),
                goal: GoalId::new(1),
                waypoints: vec![Position::new(0.0, 0.0, 0.0)],
            },
            PathDefinition {
                id: PathId::new(1),
                goal: GoalId::new(2),
                waypoints: vec![Position::new(0.0, 10.0, 0.0)],
            },
        ],
        goals: vec![
            GoalDefinition {
                id: GoalId::new(1),
                name: "north".to_owned(),
            },
            GoalDefinition {
                id: GoalId::new(2),
                name: "south".to_owned(),
            },
        ],
    };

    let mut director =
        Director::new(config, RngSource::seeded(seed), 0.0).expect("valid configuration");
    let mut host = RecordingHost::default();
    let mut events = Vec::new();

    for frame in 1..=600 {
        let now = f64::from(frame) * 0.1;
        let before = events.len();
        director.tick(now, &mut host, &mut events).expect("tick");
        let spawned = events[before..]
            .iter()
            .filter(|event| matches!(event, Event::EnemySpawned { .. }))
            .count();
        for _ in 0..spawned {
            director.on_enemy_died(&mut events);
            host.live -= 1;
        }
        if query::has_won(&director) {
            break;
        }
    }

    (events, host.spawns)
}

#[test]
fn seeded_runs_replay_identically() {
    let (first_events, first_spawns) = replay(99);
    let (second_events, second_spawns) = replay(99);

    assert_eq!(first_spawns.len(), 20);
    assert_eq!(first_events, second_events);
    assert_eq!(first_spawns, second_spawns);
    assert_eq!(wins(&first_events), 1);
}
