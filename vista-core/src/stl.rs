/// STL import for binary and ASCII files
///
/// Stored facet normals are skipped; callers recompute normals from the
/// triangles with the geometry helpers.
use log::debug;
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};
use std::fs;
use std::path::Path;

use crate::error::StlError;
use crate::geometry::Triangle;
use crate::vec::Vec3;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL buffer
pub fn parse_binary_stl(data: &[u8]) -> Result<Vec<Triangle>, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooShort);
    }

    let count_bytes = [data[80], data[81], data[82], data[83]];
    let triangle_count = u32::from_le_bytes(count_bytes) as usize;
    let body = &data[HEADER_LEN + 4..];

    let mut triangles = Vec::with_capacity(triangle_count.min(body.len() / FACET_LEN));
    for triangle in 0..triangle_count {
        let facet = body
            .get(triangle * FACET_LEN..(triangle + 1) * FACET_LEN)
            .ok_or(StlError::UnexpectedEof { triangle })?;
        // 12 bytes of normal, three 12 byte corners, 2 bytes of attributes
        triangles.push([
            read_vec3(&facet[12..24]),
            read_vec3(&facet[24..36]),
            read_vec3(&facet[36..48]),
        ]);
    }

    Ok(triangles)
}

fn read_vec3(bytes: &[u8]) -> Vec3 {
    let component = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    Vec3::new(component(0), component(4), component(8))
}

/// Parse an ASCII STL document
pub fn parse_ascii_stl(input: &str) -> Result<Vec<Triangle>, StlError> {
    match ascii_solid(input) {
        Ok((_, triangles)) => Ok(triangles),
        Err(e) => Err(StlError::Parse(format!("{:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Triangle>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, triangles))
}

fn facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, (a, b, c)) = tuple((vertex, vertex, vertex))(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, [a, b, c]))
}

fn vertex(input: &str) -> IResult<&str, Vec3> {
    preceded(preceded(multispace0, tag("vertex")), vector3)(input)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

/// Detect the format and parse. Binary files may also begin with "solid",
/// so a failed ASCII parse falls back to binary.
pub fn parse_stl(data: &[u8]) -> Result<Vec<Triangle>, StlError> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(triangles) = parse_ascii_stl(text) {
                return Ok(triangles);
            }
        }
    }
    parse_binary_stl(data)
}

pub fn load_stl(path: impl AsRef<Path>) -> Result<Vec<Triangle>, StlError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let triangles = parse_stl(&data)?;
    debug!("loaded {} triangles from {}", triangles.len(), path.display());
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TETRA_ASCII: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1.5e0
    endloop
  endfacet
endsolid tetra
";

    fn binary(triangles: &[Triangle]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in triangle {
                for value in corner.to_array() {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());
        assert!(parse_binary_stl(&data).unwrap().is_empty());
    }

    #[test]
    fn test_binary_too_short() {
        assert!(matches!(parse_binary_stl(&[0u8; 40]), Err(StlError::TooShort)));
    }

    #[test]
    fn test_binary_triangles() {
        let triangle = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(-1.0, 0.5, 0.0)];
        let triangles = parse_binary_stl(&binary(&[triangle, triangle])).unwrap();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1], triangle);
    }

    #[test]
    fn test_binary_truncated() {
        let triangle = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut data = binary(&[triangle, triangle]);
        data.truncate(data.len() - 10);
        assert!(matches!(
            parse_binary_stl(&data),
            Err(StlError::UnexpectedEof { triangle: 1 })
        ));
    }

    #[test]
    fn test_ascii_named_solid() {
        let triangles = parse_ascii_stl(TETRA_ASCII).unwrap();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0][1], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(triangles[1][2], Vec3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_ascii_garbage() {
        assert!(matches!(parse_ascii_stl("solid x\nfacet nonsense"), Err(StlError::Parse(_))));
    }

    #[test]
    fn test_detects_format() {
        assert_eq!(parse_stl(TETRA_ASCII.as_bytes()).unwrap().len(), 2);

        // binary header that happens to start with "solid"
        let mut data = binary(&[[Vec3::X, Vec3::Y, Vec3::Z]]);
        data[..5].copy_from_slice(b"solid");
        assert_eq!(parse_stl(&data).unwrap().len(), 1);
    }

    #[test]
    fn test_load_stl_from_file() {
        let path = std::env::temp_dir().join(format!("vista-stl-{}.stl", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(TETRA_ASCII.as_bytes()).unwrap();
        drop(file);

        let triangles = load_stl(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(triangles.len(), 2);

        assert!(matches!(load_stl(&path), Err(StlError::Io(_))));
    }
}
