//! Post-processing viewer demo.
//!
//! ```sh
//! cargo run --example viewer -- [asset-root] [settings.json]
//! ```
//!
//! Keys: `1`..`9` toggle passes, `G` toggles glitch "go wild", `Esc` quits.

use lumen::app::App;
use lumen::assets::AssetRequest;
use lumen::renderer::ColorSpace;
use lumen::settings::ViewerSettings;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| "assets".to_string());
    let settings = match args.next() {
        Some(path) => ViewerSettings::from_path(path)?,
        None => ViewerSettings::default(),
    };

    let env_faces = ["px", "nx", "py", "ny", "pz", "nz"].map(|f| format!("textures/environmentMaps/0/{f}.jpg"));

    App::new()
        .with_title("Post Processing")
        .with_settings(settings)
        .with_asset_root(root)
        .with_asset(AssetRequest::mesh("models/DamagedHelmet/glTF/DamagedHelmet.gltf"))
        .with_asset(AssetRequest::cube_texture(env_faces, ColorSpace::Srgb))
        .with_normal_map("textures/interfaceNormalMap.png")
        .run()?;

    Ok(())
}
