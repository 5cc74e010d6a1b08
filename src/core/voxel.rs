use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::utils::settings::WorldSettings;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum VoxelType {
    /// Outside of any loaded chunk. Never stored by generation.
    #[default]
    Nothing,
    Air,
    Water,
    Dirt,
    Grass,
    Stone,
    Sand,
    SandStone,
    Bedrock,
    Log,
    Leaves,
    Snow,
    Ice,
    Cactus,
}

impl VoxelType {
    pub const COUNT: usize = 14;

    pub const ALL: [VoxelType; Self::COUNT] = [
        VoxelType::Nothing,
        VoxelType::Air,
        VoxelType::Water,
        VoxelType::Dirt,
        VoxelType::Grass,
        VoxelType::Stone,
        VoxelType::Sand,
        VoxelType::SandStone,
        VoxelType::Bedrock,
        VoxelType::Log,
        VoxelType::Leaves,
        VoxelType::Snow,
        VoxelType::Ice,
        VoxelType::Cactus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Air and Nothing never produce geometry.
    pub fn is_empty(self) -> bool {
        matches!(self, VoxelType::Air | VoxelType::Nothing)
    }
}

/// Static per-type record used by meshing and collision.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct VoxelProperties {
    pub is_solid: bool,
    pub generates_collider: bool,
    /// Atlas tile coordinates, in tiles.
    pub top: UVec2,
    pub bottom: UVec2,
    pub side: UVec2,
}

impl VoxelProperties {
    pub const fn new(is_solid: bool, generates_collider: bool, top: UVec2, bottom: UVec2, side: UVec2) -> Self {
        Self {
            is_solid,
            generates_collider,
            top,
            bottom,
            side,
        }
    }

    pub const fn uniform(is_solid: bool, generates_collider: bool, tile: UVec2) -> Self {
        Self::new(is_solid, generates_collider, tile, tile, tile)
    }

    pub fn defaults_for(voxel: VoxelType) -> Self {
        match voxel {
            VoxelType::Nothing | VoxelType::Air => Self::uniform(false, false, UVec2::ZERO),
            VoxelType::Water => Self::uniform(false, false, UVec2::new(1, 3)),
            VoxelType::Dirt => Self::uniform(true, true, UVec2::new(2, 0)),
            VoxelType::Grass => {
                Self::new(true, true, UVec2::new(0, 0), UVec2::new(2, 0), UVec2::new(1, 0))
            }
            VoxelType::Stone => Self::uniform(true, true, UVec2::new(3, 0)),
            VoxelType::Sand => Self::uniform(true, true, UVec2::new(0, 1)),
            VoxelType::SandStone => Self::uniform(true, true, UVec2::new(1, 1)),
            VoxelType::Bedrock => Self::uniform(true, true, UVec2::new(2, 1)),
            VoxelType::Log => {
                Self::new(true, true, UVec2::new(0, 2), UVec2::new(0, 2), UVec2::new(3, 1))
            }
            VoxelType::Leaves => Self::uniform(false, true, UVec2::new(1, 2)),
            VoxelType::Snow => {
                Self::new(true, true, UVec2::new(2, 2), UVec2::new(2, 0), UVec2::new(3, 2))
            }
            VoxelType::Ice => Self::uniform(true, true, UVec2::new(0, 3)),
            VoxelType::Cactus => Self::uniform(true, true, UVec2::new(2, 3)),
        }
    }
}

/// Immutable voxel property table plus atlas layout, built once at startup
/// and shared read-only by the mesher.
#[derive(Clone, Debug)]
pub struct VoxelCatalog {
    properties: [VoxelProperties; VoxelType::COUNT],
    tile_size: Vec2,
    texture_offset: f32,
}

impl Default for VoxelCatalog {
    fn default() -> Self {
        Self {
            properties: VoxelType::ALL.map(VoxelProperties::defaults_for),
            tile_size: Vec2::splat(1.0 / ATLAS_TILES as f32),
            texture_offset: TEXTURE_OFFSET,
        }
    }
}

impl VoxelCatalog {
    pub fn from_settings(settings: &WorldSettings) -> Self {
        let mut catalog = Self {
            tile_size: Vec2::new(
                1.0 / settings.atlas.tiles_x as f32,
                1.0 / settings.atlas.tiles_y as f32,
            ),
            texture_offset: settings.atlas.texture_offset,
            ..Self::default()
        };
        for entry in &settings.voxels {
            catalog.properties[entry.kind.index()] = entry.properties();
        }
        // The sentinel is never solid, whatever the file says.
        catalog.properties[VoxelType::Nothing.index()].is_solid = false;
        catalog
    }

    pub fn properties(&self, voxel: VoxelType) -> &VoxelProperties {
        &self.properties[voxel.index()]
    }

    pub fn is_solid(&self, voxel: VoxelType) -> bool {
        self.properties(voxel).is_solid
    }

    pub fn generates_collider(&self, voxel: VoxelType) -> bool {
        self.properties(voxel).generates_collider
    }

    /// Size of one atlas tile in UV space.
    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    pub fn texture_offset(&self) -> f32 {
        self.texture_offset
    }
}
