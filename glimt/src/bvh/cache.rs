use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use glam::Vec4;

use super::{BvhData, BvhLayout};
use crate::gpu::Triangle;

const MAGIC: [u8; 4] = *b"GBVH";
const VERSION: u32 = 1;

/// Where the cache for a given scene file lives.
pub fn bvh_cache_path(scene_path: &Path) -> PathBuf {
    scene_path.with_extension("bvh")
}

/// Loads a previously cached BVH (node array, index array and the
/// leaf-ordered render triangles); `Ok(None)` when there is no usable cache,
/// so the caller falls back to the external builder.
pub fn read_bvh_cache(
    scene_path: &Path,
) -> io::Result<Option<(BvhData, Vec<Triangle>)>> {
    let path = bvh_cache_path(scene_path);

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let mut reader = BufReader::new(file);

    let mut magic = [0; 4];

    reader.read_exact(&mut magic)?;

    if magic != MAGIC {
        log::warn!("Ignoring BVH cache with wrong magic: {path:?}");
        return Ok(None);
    }

    let version = read_u32(&mut reader)?;

    if version != VERSION {
        log::warn!(
            "Ignoring BVH cache with version {version} (expected {VERSION}): \
             {path:?}"
        );

        return Ok(None);
    }

    let Some(layout) = BvhLayout::deserialize(read_u32(&mut reader)?) else {
        log::warn!("Ignoring BVH cache with unknown layout: {path:?}");
        return Ok(None);
    };

    let node_lanes = read_u32(&mut reader)? as usize;
    let index_count = read_u32(&mut reader)? as usize;
    let triangle_count = read_u32(&mut reader)? as usize;

    let nodes = read_pods::<Vec4>(&mut reader, node_lanes)?;
    let indices = read_pods::<u32>(&mut reader, index_count)?;
    let triangles = read_pods::<Triangle>(&mut reader, triangle_count)?;

    log::info!(
        "Loaded BVH cache; layout={layout:?}, nodes={node_lanes} lanes, \
         triangles={triangle_count}"
    );

    Ok(Some((
        BvhData {
            layout,
            nodes,
            indices,
        },
        triangles,
    )))
}

/// Writes the cache next to the scene file.
pub fn write_bvh_cache(
    scene_path: &Path,
    data: &BvhData,
    triangles: &[Triangle],
) -> io::Result<()> {
    let path = bvh_cache_path(scene_path);
    let mut writer = BufWriter::new(File::create(&path)?);

    writer.write_all(&MAGIC)?;
    write_u32(&mut writer, VERSION)?;
    write_u32(&mut writer, data.layout.serialize())?;
    write_u32(&mut writer, data.nodes.len() as u32)?;
    write_u32(&mut writer, data.indices.len() as u32)?;
    write_u32(&mut writer, triangles.len() as u32)?;

    writer.write_all(bytemuck::cast_slice(&data.nodes))?;
    writer.write_all(bytemuck::cast_slice(&data.indices))?;
    writer.write_all(bytemuck::cast_slice(triangles))?;
    writer.flush()?;

    log::info!("Wrote BVH cache: {path:?}");

    Ok(())
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut bytes = [0; 4];

    reader.read_exact(&mut bytes)?;

    Ok(u32::from_le_bytes(bytes))
}

fn write_u32(writer: &mut impl Write, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_pods<T>(reader: &mut impl Read, count: usize) -> io::Result<Vec<T>>
where
    T: bytemuck::Pod,
{
    let mut bytes = vec![0; count * std::mem::size_of::<T>()];

    reader.read_exact(&mut bytes)?;

    // Re-aligns, since a byte vector owes the target type no alignment
    Ok(bytemuck::pod_collect_to_vec(&bytes))
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, vec4};

    use super::*;

    #[test]
    fn round_trip() {
        let dir = std::env::temp_dir().join("glimt-bvh-cache-test");

        std::fs::create_dir_all(&dir).unwrap();

        let scene_path = dir.join("scene.obj");

        let data = BvhData {
            layout: BvhLayout::Qbvh,
            nodes: vec![
                vec4(1.0, 2.0, 3.0, 4.0),
                vec4(5.0, 6.0, 7.0, 8.0),
            ],
            indices: vec![1, 0],
        };

        let triangles = vec![Triangle::new(
            [
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            [vec3(0.0, 0.0, 1.0); 3],
            [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)],
            3,
        )];

        write_bvh_cache(&scene_path, &data, &triangles).unwrap();

        let (read_data, read_triangles) =
            read_bvh_cache(&scene_path).unwrap().unwrap();

        assert_eq!(data.layout, read_data.layout);
        assert_eq!(data.nodes, read_data.nodes);
        assert_eq!(data.indices, read_data.indices);
        assert_eq!(triangles, read_triangles);

        std::fs::remove_file(bvh_cache_path(&scene_path)).unwrap();
    }

    #[test]
    fn missing_cache_is_not_an_error() {
        let path = std::env::temp_dir().join("glimt-no-such-scene.obj");

        assert!(read_bvh_cache(&path).unwrap().is_none());
    }
}
