//! Balloon Shooter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    use balloon_shooter::audio::AudioManager;
    use balloon_shooter::consts::*;
    use balloon_shooter::sim::{
        AimCapture, ArenaKind, CameraPose, Game, InputEvent, Key, LockError, Phase, TickInput,
        WeaponKind,
    };
    use balloon_shooter::Tuning;

    // JS bindings for pointer lock and the presentation bridge
    #[wasm_bindgen(inline_js = "
        export function request_pointer_lock() {
            const canvas = document.getElementById('canvas');
            if (!canvas) {
                throw new Error('no canvas');
            }
            const result = canvas.requestPointerLock();
            if (result && result.catch) {
                // Async refusal goes through the same listener as pointerlockerror
                result.catch(e => {
                    console.warn('Pointer lock failed:', e);
                    document.dispatchEvent(new Event('pointerlockerror'));
                });
            }
        }

        export function exit_pointer_lock() {
            if (document.pointerLockElement) {
                document.exitPointerLock();
            }
        }

        export function check_pointer_lock() {
            return document.pointerLockElement !== null;
        }

        export function present_snapshot(json) {
            if (window.balloonShooterPresent) {
                window.balloonShooterPresent(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        #[wasm_bindgen(catch)]
        fn request_pointer_lock() -> Result<(), JsValue>;
        fn exit_pointer_lock();
        fn check_pointer_lock() -> bool;
        fn present_snapshot(json: &str);
    }

    /// Browser pointer lock as the aim-capture device
    struct PointerLock;

    impl AimCapture for PointerLock {
        fn request_lock(&mut self) -> Result<(), LockError> {
            request_pointer_lock().map_err(|e| LockError::Rejected(format!("{e:?}")))
        }

        fn request_unlock(&mut self) {
            exit_pointer_lock();
        }
    }

    /// Radians of camera turn per pixel of mouse movement
    const LOOK_SENSITIVITY: f32 = 0.002;
    /// Pitch limit just short of straight up/down
    const PITCH_LIMIT: f32 = 1.55;

    /// Shell state wrapped around the simulation
    struct Shell {
        game: Game,
        accumulator: f32,
        last_time: f64,
        yaw: f32,
        pitch: f32,
    }

    impl Shell {
        fn new(seed: u64) -> Self {
            Self {
                game: Game::new(
                    Tuning::default(),
                    seed,
                    Box::new(PointerLock),
                    Box::new(AudioManager::new()),
                ),
                accumulator: 0.0,
                last_time: 0.0,
                yaw: 0.0,
                pitch: 0.0,
            }
        }

        fn look(&mut self, dx: f32, dy: f32) {
            self.yaw -= dx * LOOK_SENSITIVITY;
            self.pitch = (self.pitch - dy * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let input = TickInput {
                camera_rotation: CameraPose::look_rotation(self.yaw, self.pitch),
            };
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.game.tick(SIM_DT, &input);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            for event in self.game.drain_events() {
                log::debug!("{:?}", event);
            }
        }

        fn present(&self) {
            match serde_json::to_string(&self.game.snapshot()) {
                Ok(json) => present_snapshot(&json),
                Err(e) => log::warn!("Snapshot serialization failed: {}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let snapshot = self.game.snapshot();

            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&snapshot.hud.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("time") {
                el.set_text_content(Some(&snapshot.hud.time_remaining.to_string()));
            }

            for (id, phase) in [
                ("title-menu", Phase::Idle),
                ("weapon-menu", Phase::WeaponSelect),
                ("map-menu", Phase::MapSelect),
                ("hud", Phase::Playing),
                ("pause-menu", Phase::Paused),
                ("game-over", Phase::GameOver),
            ] {
                if let Some(el) = document.get_element_by_id(id) {
                    let class = if snapshot.hud.phase == phase { "" } else { "hidden" };
                    let _ = el.set_attribute("class", class);
                }
            }
            if let Some(el) = document.get_element_by_id("final-score") {
                el.set_text_content(Some(&snapshot.hud.score.to_string()));
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {e}").into());
        }

        log::info!("Balloon Shooter starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let shell = Rc::new(RefCell::new(Shell::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&document, shell.clone());
        setup_menus(shell.clone());
        request_animation_frame(shell);

        log::info!("Balloon Shooter running!");
    }

    fn listen<E, F>(target: &web_sys::EventTarget, name: &str, handler: F)
    where
        E: wasm_bindgen::convert::FromWasmAbi + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(document: &web_sys::Document, shell: Rc<RefCell<Shell>>) {
        // Pointer lock flag changes
        {
            let shell = shell.clone();
            listen(document, "pointerlockchange", move |_: web_sys::Event| {
                let event = if check_pointer_lock() {
                    log::info!("Pointer lock acquired");
                    InputEvent::CaptureAcquired
                } else {
                    log::info!("Pointer lock released");
                    InputEvent::CaptureLost
                };
                shell.borrow_mut().game.handle_event(event);
            });
        }

        {
            let shell = shell.clone();
            listen(document, "pointerlockerror", move |_: web_sys::Event| {
                log::warn!("Pointer lock error");
                shell.borrow_mut().game.handle_event(InputEvent::CaptureFailed);
            });
        }

        // Look (only while captured)
        {
            let shell = shell.clone();
            listen(document, "mousemove", move |event: MouseEvent| {
                let mut s = shell.borrow_mut();
                if s.game.lock().is_captured() {
                    s.look(event.movement_x() as f32, event.movement_y() as f32);
                }
            });
        }

        // Fire, or ask for capture on the first click
        {
            let shell = shell.clone();
            listen(document, "mousedown", move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let mut s = shell.borrow_mut();
                if s.game.lock().is_captured() {
                    s.game.handle_event(InputEvent::FireDown);
                } else {
                    s.game.request_capture();
                }
            });
        }

        {
            let shell = shell.clone();
            listen(document, "keydown", move |event: KeyboardEvent| {
                let mut s = shell.borrow_mut();
                if event.code() == "Escape" {
                    s.game.handle_event(InputEvent::EscapePressed);
                } else if let Some(key) = Key::from_code(&event.code()) {
                    if key == Key::Jump {
                        event.prevent_default();
                    }
                    s.game.handle_event(InputEvent::KeyDown(key));
                }
            });
        }

        listen(document, "keyup", move |event: KeyboardEvent| {
            if let Some(key) = Key::from_code(&event.code()) {
                shell.borrow_mut().game.handle_event(InputEvent::KeyUp(key));
            }
        });
    }

    fn on_click(id: &str, shell: Rc<RefCell<Shell>>, action: fn(&mut Game)) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id(id) {
            listen(&btn, "click", move |_: MouseEvent| {
                action(&mut shell.borrow_mut().game);
            });
        }
    }

    fn report(result: Result<(), balloon_shooter::sim::TransitionError>) {
        if let Err(e) = result {
            log::warn!("{}", e);
        }
    }

    fn setup_menus(shell: Rc<RefCell<Shell>>) {
        on_click("start-btn", shell.clone(), |g| report(g.start_game()));
        on_click("weapon-pistol", shell.clone(), |g| {
            report(g.select_weapon(WeaponKind::Pistol))
        });
        on_click("weapon-rifle", shell.clone(), |g| {
            report(g.select_weapon(WeaponKind::Rifle))
        });
        on_click("weapon-sniper", shell.clone(), |g| {
            report(g.select_weapon(WeaponKind::Sniper))
        });
        on_click("weapon-back-btn", shell.clone(), |g| report(g.cancel_weapon_select()));
        on_click("arena-desert", shell.clone(), |g| {
            report(g.select_arena(ArenaKind::Desert))
        });
        on_click("arena-mountain", shell.clone(), |g| {
            report(g.select_arena(ArenaKind::Mountain))
        });
        on_click("arena-city", shell.clone(), |g| report(g.select_arena(ArenaKind::City)));
        on_click("map-back-btn", shell.clone(), |g| report(g.back_to_weapon_select()));
        on_click("resume-btn", shell.clone(), |g| report(g.resume()));
        on_click("restart-btn", shell.clone(), |g| report(g.restart()));
        on_click("change-weapon-btn", shell.clone(), |g| report(g.change_weapon()));
        on_click("change-map-btn", shell.clone(), |g| report(g.change_map()));
        on_click("quit-btn", shell, |g| report(g.quit()));
    }

    fn request_animation_frame(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(shell, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(shell: Rc<RefCell<Shell>>, time: f64) {
        {
            let mut s = shell.borrow_mut();

            let dt = if s.last_time > 0.0 {
                ((time - s.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            s.last_time = time;

            s.update(dt);
            s.present();
            s.update_hud();
        }

        request_animation_frame(shell);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Balloon Shooter (native) starting...");
    log::info!("Native mode runs a headless scripted round - use the web build to play");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => balloon_shooter::Tuning::default(),
    };

    demo::run(tuning);
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Result<balloon_shooter::Tuning, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(balloon_shooter::Tuning::from_json(&json)?)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless round: an aimbot with the sniper shoots the nearest balloon
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use balloon_shooter::consts::SIM_DT;
    use balloon_shooter::sim::{ArenaKind, Game, GameEvent, InputEvent, Phase, TickInput, WeaponKind};
    use balloon_shooter::Tuning;
    use glam::{Quat, Vec3};

    pub fn run(tuning: Tuning) {
        let mut game = Game::headless(tuning, 7);
        let setup = game
            .start_game()
            .and_then(|_| game.select_weapon(WeaponKind::Sniper))
            .and_then(|_| game.select_arena(ArenaKind::Desert));
        if let Err(e) = setup {
            log::error!("Menu flow failed: {}", e);
            return;
        }
        game.handle_event(InputEvent::CaptureAcquired);

        let mut shots = 0u32;
        let mut pops = 0u32;
        let mut input = TickInput::default();
        let max_ticks = (game.tuning().session.round_seconds as usize + 1) * 60;

        for _ in 0..max_ticks {
            if game.phase() != Phase::Playing {
                break;
            }
            if let Some(rotation) = aim_at_nearest(&game) {
                input.camera_rotation = rotation;
                if game.weapon().is_ready() {
                    game.handle_event(InputEvent::FireDown);
                }
            }
            game.tick(SIM_DT, &input);

            for event in game.drain_events() {
                match event {
                    GameEvent::WeaponFired { .. } => shots += 1,
                    GameEvent::TargetPopped { .. } => pops += 1,
                    _ => {}
                }
            }
        }

        let snapshot = game.snapshot();
        log::info!(
            "Round finished in phase {}: {} points, {} shots, {} balloons popped",
            snapshot.hud.phase.as_str(),
            snapshot.hud.score,
            shots,
            pops
        );
    }

    fn aim_at_nearest(game: &Game) -> Option<Quat> {
        let eye = game.snapshot().camera.position;
        game.population()
            .targets()
            .iter()
            .map(|t| t.position - eye)
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .map(|dir| Quat::from_rotation_arc(Vec3::NEG_Z, dir.normalize_or(Vec3::NEG_Z)))
    }
}
