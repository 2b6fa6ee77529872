use brisk_shared::Vec3;

/// One placed object of a level baseline
#[derive(Clone, Debug, PartialEq)]
pub struct LevelEntity {
    /// Catalog name of the asset to spawn
    pub asset: String,
    pub position: Vec3,
    /// Euler angles, like the `rotation` transform field
    pub rotation: Vec3,
}

impl LevelEntity {
    pub fn new(asset: &str, position: Vec3, rotation: Vec3) -> Self {
        Self {
            asset: asset.to_string(),
            position,
            rotation,
        }
    }
}
