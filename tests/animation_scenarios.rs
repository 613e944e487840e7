//! Whole-gallery runs stepped with fixed time steps, no GPU involved.

use std::rc::Rc;

use reveal_gallery::animation::{ClockTween, Easing, FrameInput, LAG_STEP, ScrollScrub, Timeline};
use reveal_gallery::*;
use winit::event::ElementState;

fn red_image() -> Rc<ImageSource> {
    let pixels = image::RgbaImage::from_pixel(16, 10, image::Rgba([255, 0, 0, 255]));
    Rc::new(ImageSource::from_rgba("red".into(), pixels))
}

fn gallery(config: &GalleryConfig) -> Gallery {
    let image = red_image();
    Gallery::with_images(config, |_| Some(image.clone())).unwrap()
}

fn run(gallery: &mut Gallery, frames: usize, dt: f32) {
    let input = Input::new();
    for _ in 0..frames {
        gallery.frame_fixed(&input, dt);
    }
}

fn press(key: KeyCode) -> Input {
    let mut input = Input::new();
    input.key_event(key, ElementState::Pressed);
    input
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn every_plane_settles_fully_revealed_and_in_place() {
    let mut gallery = gallery(&GalleryConfig::default());
    // Longest plane: 0.6s delay, 0.2s lag, 1.8s entry.
    run(&mut gallery, 30, 0.1);

    for plane in gallery.planes() {
        let uniforms = plane.uniforms().read();
        assert_eq!(uniforms.reveal(), 1.0, "{}", plane.config().image.display());
        assert_eq!(uniforms.enter_progress(), 1.0);
        assert_eq!(uniforms.exit_progress(), 0.0);
        let center = plane.world_center().unwrap();
        assert!((center - plane.config().position).length() < 1e-5);
    }
}

#[test]
fn later_planes_wait_for_their_delay() {
    let mut gallery = gallery(&GalleryConfig::default());
    run(&mut gallery, 5, 0.05);

    for plane in gallery.planes() {
        let reveal = plane.uniforms().read().reveal();
        if plane.config().delay > 0.25 {
            assert_eq!(reveal, 0.0, "{}", plane.config().image.display());
        } else {
            assert!(reveal > 0.0);
        }
    }
}

#[test]
fn wide_plane_shows_the_cropped_image_after_reveal() {
    let mut gallery = gallery(&GalleryConfig::controls());
    run(&mut gallery, 20, 0.1);

    let plane = &gallery.planes()[0];
    let uniforms = plane.uniforms().read();
    assert_eq!(uniforms.reveal(), 1.0);

    // 5x3 plane over a 1.6 image: full width, 96% of the height.
    let cover = plane.graph().cover();
    assert_eq!(cover.scale.x, 1.0);
    assert!(close(cover.scale.y, 0.96));

    let graph = plane.graph();
    let center = graph.color_at(Vec2::splat(0.5), uniforms, plane.image()).unwrap();
    assert!((center - Vec4::new(1.0, 0.0, 0.0, 1.0)).length() < 1e-5);

    let corner = graph.color_at(Vec2::new(0.001, 0.001), uniforms, plane.image()).unwrap();
    assert_eq!(corner.w, 0.0);
}

#[test]
fn replay_restarts_every_plane_from_hidden() {
    let mut gallery = gallery(&GalleryConfig::default());
    run(&mut gallery, 30, 0.1);

    gallery.frame_fixed(&press(KeyCode::KeyR), 0.1);
    for plane in gallery.planes() {
        let uniforms = plane.uniforms().read();
        assert_eq!(uniforms.reveal(), 0.0);
        assert_eq!(uniforms.enter_progress(), 0.0);
    }

    run(&mut gallery, 30, 0.1);
    assert!(gallery.planes().iter().all(|p| p.uniforms().read().reveal() == 1.0));
}

#[test]
fn scrolling_down_pushes_planes_out_by_side() {
    let mut gallery = gallery(&GalleryConfig::default());
    run(&mut gallery, 30, 0.1);

    // Halfway down the page.
    let mut input = Input::new();
    input.scroll_event(Vec2::new(0.0, -GalleryConfig::DEFAULT_SCROLL_EXTENT / 2.0));
    gallery.frame_fixed(&input, 0.1);
    assert!(close(gallery.scroll().progress(), 0.5));

    for plane in gallery.planes() {
        let delay = plane.config().delay;
        let exit = plane.uniforms().read().exit_progress();
        let threshold = ScrollScrub::new(delay).threshold();
        if threshold >= 0.5 {
            assert_eq!(exit, 0.0, "{}", plane.config().image.display());
        } else {
            assert!(close(exit, ScrollScrub::new(delay).map(0.5)));
        }
    }

    // All the way down.
    gallery.scroll_mut().set_progress(1.0);
    run(&mut gallery, 1, 0.1);
    for plane in gallery.planes() {
        let config = plane.config();
        assert!(close(plane.uniforms().read().exit_progress(), 1.0));
        let side = if config.position.x < 0.0 { -1.5 } else { 1.5 };
        let expected = config.position + Vec3::new(side, 10.0, 2.0);
        assert!((plane.world_center().unwrap() - expected).length() < 1e-3);
    }

    // Back to the top.
    gallery.scroll_mut().set_progress(0.0);
    run(&mut gallery, 1, 0.1);
    assert!(gallery.planes().iter().all(|p| p.uniforms().read().exit_progress() == 0.0));
}

#[test]
fn planes_are_drawn_back_to_front() {
    let mut gallery = gallery(&GalleryConfig::default());
    run(&mut gallery, 30, 0.1);

    let order = gallery.draw_order().unwrap();
    assert_eq!(order.len(), gallery.planes().len());
    let depths: Vec<f32> = order
        .iter()
        .map(|&i| gallery.planes()[i].world_center().unwrap().z)
        .collect();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(gallery.planes()[order[0]].config().position.z, -3.0);
}

#[test]
fn panel_takes_over_until_replay() {
    let mut gallery = gallery(&GalleryConfig::controls());
    run(&mut gallery, 5, 0.1);
    let mirrored = gallery.panel().unwrap().value(Channel::Reveal);
    assert!(close(mirrored, Easing::EaseOut.apply(0.5)));

    // Reveal is selected by default; step it down once.
    gallery.frame_fixed(&press(KeyCode::ArrowDown), 0.1);
    let held = gallery.planes()[0].uniforms().read().reveal();
    assert!(close(held, 0.74));
    assert_eq!(gallery.planes()[0].uniforms().authority(), UniformWriter::Panel);

    run(&mut gallery, 20, 0.1);
    assert_eq!(gallery.planes()[0].uniforms().read().reveal(), held);
    assert!(gallery.title("Gallery").contains("Reveal: 0.74"));

    gallery.frame_fixed(&press(KeyCode::KeyR), 0.1);
    assert_eq!(gallery.planes()[0].uniforms().authority(), UniformWriter::Timeline);
    assert_eq!(gallery.planes()[0].uniforms().read().reveal(), 0.0);
    run(&mut gallery, 20, 0.1);
    assert_eq!(gallery.planes()[0].uniforms().read().reveal(), 1.0);
}

#[test]
fn stalled_frames_advance_by_one_short_step() {
    let mut gallery = gallery(&GalleryConfig::controls());
    gallery.frame_fixed(&Input::new(), 5.0);
    assert!(close(gallery.ticker().elapsed(), LAG_STEP));
    assert_eq!(gallery.planes()[0].uniforms().read().reveal(), Easing::EaseOut.apply(LAG_STEP));
}

#[test]
fn restarting_a_timeline_lands_exactly_on_the_new_target() {
    let mut timeline = Timeline::new();
    timeline.start(ClockTween::new(0.0, 1.0, 1.0).easing(Easing::EaseOut));
    let frame = |elapsed| FrameInput {
        elapsed,
        ..Default::default()
    };
    let midway = timeline.step(&frame(0.3)).unwrap();
    assert!(midway > 0.0 && midway < 1.0);

    timeline.start(ClockTween::new(midway, 0.25, 0.5).starting_at(0.3));
    assert_eq!(timeline.step(&frame(0.3)), Some(midway));
    assert_eq!(timeline.step(&frame(10.0)), Some(0.25));
    assert!(timeline.is_finished());
}
