//! Every program the gallery can generate must pass naga's WGSL front end and
//! validator, so pipeline creation never sees an invalid module.

use reveal_gallery::shader_graph::*;
use reveal_gallery::{ImageInfo, PlaneConfig, RevealGraph};

fn validate(source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(err) => panic!("WGSL parse failed: {}\n{source}", err.emit_to_string(source)),
    };
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    if let Err(err) = validator.validate(&module) {
        panic!("WGSL validation failed: {err:?}\n{source}");
    }
    module
}

fn image(width: u32, height: u32) -> ImageInfo {
    ImageInfo {
        source: format!("{width}x{height}"),
        width,
        height,
    }
}

fn entry_points(module: &naga::Module) -> Vec<(String, naga::ShaderStage)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.name.clone(), ep.stage))
        .collect()
}

#[test]
fn gallery_programs_validate() {
    let layouts = [
        PlaneConfig::new("a.jpeg", 5.0, 3.0, [1.0, 0.0, 0.0]),
        PlaneConfig::new("b.jpeg", 1.0, 1.0, [-1.0, 0.5, -2.0]).blurred(true),
        PlaneConfig::new("c.jpeg", 2.0, 3.0, [0.0, 0.0, 0.0]).delay(0.4),
        PlaneConfig::new("d.jpeg", 3.0, 2.0, [-0.5, -1.0, 1.0]).blurred(true),
    ];
    for config in &layouts {
        for info in [image(1600, 1000), image(600, 900)] {
            let graph = RevealGraph::build(config, &info).unwrap();
            let program = graph.compile().unwrap();
            let module = validate(&program.source);
            let entries = entry_points(&module);
            assert!(entries.contains(&(VERTEX_ENTRY.to_string(), naga::ShaderStage::Vertex)));
            assert!(entries.contains(&(FRAGMENT_ENTRY.to_string(), naga::ShaderStage::Fragment)));
        }
    }
}

#[test]
fn blur_helper_is_part_of_every_plane_program() {
    // The blur flag is a uniform, so sharp planes still carry the blur branch.
    let sharp = PlaneConfig::new("a.jpeg", 5.0, 3.0, [0.0, 0.0, 0.0]);
    let graph = RevealGraph::build(&sharp, &image(16, 10)).unwrap();
    let program = graph.compile().unwrap();
    assert!(program.source.contains("fn hash_blur"));
    assert!(program.source.contains("fn rotation3d_y"));
    validate(&program.source);
}

#[test]
fn fingerprints_are_stable_and_track_the_graph() {
    let info = image(1600, 1000);
    let sharp = PlaneConfig::new("a.jpeg", 5.0, 3.0, [1.0, 0.0, 0.0]);
    let blurred = sharp.clone().blurred(true);
    let left = PlaneConfig::new("a.jpeg", 5.0, 3.0, [-1.0, 0.0, 0.0]);

    let first = RevealGraph::build(&sharp, &info).unwrap().compile().unwrap();
    let again = RevealGraph::build(&sharp, &info).unwrap().compile().unwrap();
    assert_eq!(first.fingerprint, again.fingerprint);
    assert_eq!(first.source, again.source);

    // Moving the plane along y or z does not change its program.
    let moved = PlaneConfig::new("a.jpeg", 5.0, 3.0, [2.0, 4.0, -3.0]);
    let moved = RevealGraph::build(&moved, &info).unwrap().compile().unwrap();
    assert_eq!(first.fingerprint, moved.fingerprint);

    let left = RevealGraph::build(&left, &info).unwrap().compile().unwrap();
    assert_ne!(first.fingerprint, left.fingerprint);

    // The blur flag only changes a uniform, never the source.
    let blurred = RevealGraph::build(&blurred, &info).unwrap().compile().unwrap();
    assert_eq!(first.fingerprint, blurred.fingerprint);

    let other_image = RevealGraph::build(&sharp, &image(600, 900)).unwrap().compile().unwrap();
    assert_ne!(first.fingerprint, other_image.fingerprint);
}

#[test]
fn hand_built_graphs_validate() {
    let reveal = uniform(Uniform::Reveal);
    let base = texture(uv());
    let wobble = mul(sin(mul(uv().x(), 12.0)), 0.02);
    let warped = texture(add(uv(), vec2(wobble, float(0.0))));
    let color = mix(
        vec4([base.rgb(), float(0.0)]),
        select(greater_than(&reveal, 0.5), warped, base),
        &reveal,
    );
    let position = add(
        mul(rotation3d_y(neg(uniform(Uniform::EnterProgress))), position_local()),
        vec3(0.0, fract(uniform(Uniform::ExitProgress)), 0.0),
    );
    let program = compile_program(&color, &position).unwrap();
    validate(&program.source);
}
