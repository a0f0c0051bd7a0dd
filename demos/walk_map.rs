use macroquad::prelude::*;
use std::rc::Rc;
use tiled_scene::{
    Direction, Entity, FrameTime, HitBox, IRect, Level, MovementComponent, ScreenCanvas,
    SolidBodyComponent, TileImage,
};

const TARGET_FPS: f32 = 60.0;

const KEYS: [(KeyCode, Direction); 4] = [
    (KeyCode::Up, Direction::Up),
    (KeyCode::Left, Direction::Left),
    (KeyCode::Down, Direction::Down),
    (KeyCode::Right, Direction::Right),
];

fn window_conf() -> Conf {
    Conf {
        window_title: "Walk Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn spawn_player(tile_w: u32, tile_h: u32) -> Entity {
    let image = Image::gen_image_color(tile_w as u16, tile_h as u16, YELLOW);
    let mut player = Entity::new(ivec2(0, 0), 0, Some(Rc::new(TileImage::new(image))));
    player.add_component(MovementComponent::new(2, 0));
    player.add_component(SolidBodyComponent::with_hitboxes([(
        "body",
        HitBox::new(IRect::new(2, 2, tile_w as i32 - 4, tile_h as i32 - 4)).visible(true),
    )]));
    player
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let map = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/map.tmx".to_owned());
    let mut level = match Level::load(&map, "assets") {
        Ok(level) => level,
        Err(e) => {
            log::error!("{:#}", e);
            return;
        }
    };
    let mut player = spawn_player(level.tile_w, level.tile_h);

    loop {
        let time = FrameTime::from_macroquad(TARGET_FPS);

        if let Some(movement) = player.get_mut::<MovementComponent>() {
            for (key, direction) in KEYS {
                if is_key_down(key) {
                    movement.move_toward(direction, true, time.dt);
                } else {
                    movement.stop(direction);
                }
            }
        }
        if is_key_pressed(KeyCode::H) {
            level.scene.show_hitboxes = !level.scene.show_hitboxes;
        }

        let previous = player.position();
        player.update(time);
        level.scene.update(time);
        if !level.scene.collisions_near(&player).is_empty() {
            player.set_position(previous);
        }

        clear_background(BLACK);
        let view_min = vec2(0.0, 0.0);
        let view_max = vec2(screen_width(), screen_height());
        level.draw_visible_rect(view_min, view_max);
        player.draw(&mut ScreenCanvas, IVec2::ZERO);

        draw_text(
            &format!("FPS: {}  entities: {}", get_fps(), level.scene.len()),
            screen_width() - 320.0,
            55.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
