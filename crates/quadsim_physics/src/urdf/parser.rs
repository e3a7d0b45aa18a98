//! URDF XML parser
//!
//! Streams the document with quick-xml and builds a [`UrdfRobot`]. Elements
//! the simulator has no use for (`gazebo`, `transmission`, ...) are skipped.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use quadsim_math::Vec3;

use super::error::UrdfError;
use super::types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfMaterial, UrdfOrigin, UrdfRobot, UrdfVisual,
};

type Result<T> = std::result::Result<T, UrdfError>;

/// Parse a URDF document held in memory
pub fn parse_urdf_str(xml: &str) -> Result<UrdfRobot> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    parse_document(&mut reader)
}

fn parse_document<R: BufRead>(reader: &mut Reader<R>) -> Result<UrdfRobot> {
    let mut buf = Vec::new();
    let mut robot = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(reader, e)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    robot.ok_or_else(|| UrdfError::missing_element("robot", "URDF document"))
}

fn parse_robot<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfRobot> {
    let mut robot = UrdfRobot::new(get_attribute(start, "name")?);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"link" => robot.links.push(parse_link(reader, e)?),
                    b"joint" => robot.joints.push(parse_joint(reader, e)?),
                    b"material" => robot.materials.push(parse_material(reader, e)?),
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"link" => robot.links.push(UrdfLink::new(get_attribute(e, "name")?)),
                b"material" => robot.materials.push(UrdfMaterial {
                    name: get_attribute(e, "name")?,
                    color: None,
                }),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"robot" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in robot".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(robot)
}

fn parse_material<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfMaterial> {
    let mut material = UrdfMaterial {
        name: get_attribute(start, "name")?,
        color: None,
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"color" {
                    material.color = Some(parse_rgba(e)?);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"material" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in material".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(material)
}

fn parse_link<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfLink> {
    let mut link = UrdfLink::new(get_attribute(start, "name")?);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"inertial" => link.inertial = Some(parse_inertial(reader)?),
                    b"visual" => link.visuals.push(parse_visual(reader, e)?),
                    b"collision" => link.collisions.push(parse_collision(reader, e)?),
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in link".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(link)
}

fn parse_inertial<R: BufRead>(reader: &mut Reader<R>) -> Result<UrdfInertial> {
    let mut inertial = UrdfInertial::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => inertial.origin = parse_origin(e)?,
                b"mass" => {
                    let value = get_attribute(e, "value")?;
                    inertial.mass = value.parse().map_err(|_| {
                        UrdfError::invalid_attribute("value", "mass", "expected a number")
                    })?;
                }
                b"inertia" => {
                    inertial.inertia = UrdfInertia {
                        ixx: parse_float_attr(e, "ixx").unwrap_or(0.0),
                        ixy: parse_float_attr(e, "ixy").unwrap_or(0.0),
                        ixz: parse_float_attr(e, "ixz").unwrap_or(0.0),
                        iyy: parse_float_attr(e, "iyy").unwrap_or(0.0),
                        iyz: parse_float_attr(e, "iyz").unwrap_or(0.0),
                        izz: parse_float_attr(e, "izz").unwrap_or(0.0),
                    };
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"inertial" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in inertial".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(inertial)
}

fn parse_visual<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfVisual> {
    let name = get_attribute_opt(start, "name");
    let mut origin = UrdfOrigin::default();
    let mut geometry = None;
    let mut material = None;
    let mut color = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => origin = parse_origin(e)?,
                b"geometry" => geometry = Some(parse_geometry(reader)?),
                b"material" => material = get_attribute_opt(e, "name"),
                // Inline colour nested inside <material>
                b"color" => color = Some(parse_rgba(e)?),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"visual" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in visual".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let geometry = geometry.ok_or_else(|| UrdfError::missing_element("geometry", "visual"))?;

    Ok(UrdfVisual {
        name,
        origin,
        geometry,
        material,
        color,
    })
}

fn parse_collision<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
) -> Result<UrdfCollision> {
    let name = get_attribute_opt(start, "name");
    let mut origin = UrdfOrigin::default();
    let mut geometry = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"origin" => origin = parse_origin(e)?,
                b"geometry" => geometry = Some(parse_geometry(reader)?),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"collision" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in collision".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let geometry = geometry.ok_or_else(|| UrdfError::missing_element("geometry", "collision"))?;

    Ok(UrdfCollision {
        name,
        origin,
        geometry,
    })
}

fn parse_geometry<R: BufRead>(reader: &mut Reader<R>) -> Result<UrdfGeometry> {
    let mut buf = Vec::new();
    let mut geometry = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"box" => {
                    let size = parse_vector3(&get_attribute(e, "size")?)?;
                    geometry = Some(UrdfGeometry::Box { size });
                }
                b"cylinder" => {
                    let radius = parse_float_attr(e, "radius")
                        .ok_or_else(|| UrdfError::missing_attribute("radius", "cylinder"))?;
                    let length = parse_float_attr(e, "length")
                        .ok_or_else(|| UrdfError::missing_attribute("length", "cylinder"))?;
                    geometry = Some(UrdfGeometry::Cylinder { radius, length });
                }
                b"sphere" => {
                    let radius = parse_float_attr(e, "radius")
                        .ok_or_else(|| UrdfError::missing_attribute("radius", "sphere"))?;
                    geometry = Some(UrdfGeometry::Sphere { radius });
                }
                b"mesh" => {
                    let filename = get_attribute(e, "filename")?;
                    let scale = get_attribute_opt(e, "scale")
                        .map(|s| parse_vector3(&s))
                        .transpose()?;
                    geometry = Some(UrdfGeometry::Mesh { filename, scale });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"geometry" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in geometry".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    geometry.ok_or_else(|| UrdfError::missing_element("shape", "geometry"))
}

fn parse_joint<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<UrdfJoint> {
    let name = get_attribute(start, "name")?;
    let type_str = get_attribute(start, "type")?;
    let joint_type =
        UrdfJointType::parse(&type_str).ok_or(UrdfError::UnknownJointType(type_str))?;

    let mut parent = None;
    let mut child = None;
    let mut origin = UrdfOrigin::default();
    let mut axis = Vec3::X;
    let mut limit = None;
    let mut dynamics = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"parent" => parent = Some(get_attribute(e, "link")?),
                b"child" => child = Some(get_attribute(e, "link")?),
                b"origin" => origin = parse_origin(e)?,
                b"axis" => {
                    if let Some(xyz) = get_attribute_opt(e, "xyz") {
                        axis = parse_vector3(&xyz)?;
                    }
                }
                b"limit" => {
                    limit = Some(UrdfJointLimit {
                        lower: parse_float_attr(e, "lower").unwrap_or(0.0),
                        upper: parse_float_attr(e, "upper").unwrap_or(0.0),
                        effort: parse_float_attr(e, "effort").unwrap_or(0.0),
                        velocity: parse_float_attr(e, "velocity").unwrap_or(0.0),
                    });
                }
                b"dynamics" => {
                    dynamics = Some(UrdfJointDynamics {
                        damping: parse_float_attr(e, "damping").unwrap_or(0.0),
                        friction: parse_float_attr(e, "friction").unwrap_or(0.0),
                    });
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => return Err(UrdfError::Xml("unexpected EOF in joint".into())),
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let parent =
        parent.ok_or_else(|| UrdfError::missing_element("parent", format!("joint '{}'", name)))?;
    let child =
        child.ok_or_else(|| UrdfError::missing_element("child", format!("joint '{}'", name)))?;

    Ok(UrdfJoint {
        name,
        joint_type,
        parent,
        child,
        origin,
        axis: axis.normalized(),
        limit,
        dynamics,
    })
}

fn parse_origin(e: &BytesStart) -> Result<UrdfOrigin> {
    let xyz = get_attribute_opt(e, "xyz")
        .map(|s| parse_vector3(&s))
        .transpose()?
        .unwrap_or(Vec3::ZERO);
    let rpy = get_attribute_opt(e, "rpy")
        .map(|s| parse_vector3(&s))
        .transpose()?
        .unwrap_or(Vec3::ZERO);
    Ok(UrdfOrigin::new(xyz, rpy))
}

fn parse_rgba(e: &BytesStart) -> Result<[f32; 4]> {
    let rgba = get_attribute(e, "rgba")?;
    let parts = parse_floats(&rgba)?;
    if parts.len() != 4 {
        return Err(UrdfError::invalid_attribute(
            "rgba",
            "color",
            format!("expected 4 values, got {}", parts.len()),
        ));
    }
    Ok([parts[0] as f32, parts[1] as f32, parts[2] as f32, parts[3] as f32])
}

fn get_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    get_attribute_opt(e, name).ok_or_else(|| UrdfError::missing_attribute(name, element_name(e)))
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| String::from_utf8(attr.value.to_vec()).ok())
}

fn parse_float_attr(e: &BytesStart, name: &str) -> Option<f64> {
    get_attribute_opt(e, name).and_then(|s| s.trim().parse().ok())
}

fn parse_floats(s: &str) -> Result<Vec<f64>> {
    s.split_whitespace()
        .map(|p| p.parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| UrdfError::Xml(format!("invalid number list: {}", s)))
}

fn parse_vector3(s: &str) -> Result<Vec3> {
    let parts = parse_floats(s)?;
    if parts.len() != 3 {
        return Err(UrdfError::Xml(format!(
            "expected 3 values in vector, got {}: {}",
            parts.len(),
            s
        )));
    }
    Ok(Vec3::new(parts[0], parts[1], parts[2]))
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Skip an element and all its children
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(UrdfError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEG: &str = r#"
        <robot name="leg">
            <material name="black"><color rgba="0.1 0.1 0.1 1"/></material>
            <link name="base">
                <inertial>
                    <origin xyz="0 0 0.01"/>
                    <mass value="16.8"/>
                    <inertia ixx="0.2" iyy="0.6" izz="0.7"/>
                </inertial>
                <visual>
                    <geometry><box size="0.5 0.3 0.2"/></geometry>
                    <material name="black"/>
                </visual>
            </link>
            <link name="thigh">
                <collision>
                    <origin xyz="0 0 -0.25"/>
                    <geometry><sphere radius="0.03"/></geometry>
                </collision>
            </link>
            <joint name="HFE" type="revolute">
                <parent link="base"/>
                <child link="thigh"/>
                <origin xyz="0.3 0.1 0" rpy="0 0 0"/>
                <axis xyz="0 1 0"/>
                <limit lower="-9.42" upper="9.42" effort="80" velocity="15"/>
                <dynamics damping="0.1"/>
            </joint>
            <gazebo reference="thigh"><mu1>0.8</mu1></gazebo>
        </robot>
    "#;

    #[test]
    fn test_parse_leg() {
        let robot = parse_urdf_str(LEG).unwrap();
        assert_eq!(robot.name, "leg");
        assert_eq!(robot.links.len(), 2);
        assert_eq!(robot.joints.len(), 1);
        assert_eq!(robot.material_color("black"), Some([0.1, 0.1, 0.1, 1.0]));

        let base = robot.link("base").unwrap();
        let inertial = base.inertial.unwrap();
        assert_eq!(inertial.mass, 16.8);
        assert_eq!(inertial.origin.xyz, Vec3::new(0.0, 0.0, 0.01));
        assert_eq!(inertial.inertia.diagonal(), Vec3::new(0.2, 0.6, 0.7));
        assert_eq!(base.visuals[0].material.as_deref(), Some("black"));
    }

    #[test]
    fn test_parse_joint_fields() {
        let robot = parse_urdf_str(LEG).unwrap();
        let joint = robot.joint("HFE").unwrap();
        assert_eq!(joint.joint_type, UrdfJointType::Revolute);
        assert_eq!(joint.parent, "base");
        assert_eq!(joint.child, "thigh");
        assert_eq!(joint.axis, Vec3::Y);
        assert_eq!(joint.origin.xyz, Vec3::new(0.3, 0.1, 0.0));
        let limit = joint.limit.unwrap();
        assert_eq!(limit.effort, 80.0);
        assert_eq!(limit.velocity, 15.0);
        assert_eq!(joint.dynamics.unwrap().damping, 0.1);
    }

    #[test]
    fn test_parse_collision_sphere() {
        let robot = parse_urdf_str(LEG).unwrap();
        let thigh = robot.link("thigh").unwrap();
        assert_eq!(thigh.collisions.len(), 1);
        assert_eq!(thigh.collisions[0].geometry, UrdfGeometry::Sphere { radius: 0.03 });
        assert_eq!(thigh.collisions[0].origin.xyz, Vec3::new(0.0, 0.0, -0.25));
    }

    #[test]
    fn test_inline_visual_color() {
        let xml = r#"
            <robot name="r">
                <link name="base">
                    <visual>
                        <geometry><cylinder radius="0.05" length="0.2"/></geometry>
                        <material name="red"><color rgba="1 0 0 1"/></material>
                    </visual>
                </link>
            </robot>
        "#;
        let robot = parse_urdf_str(xml).unwrap();
        let visual = &robot.link("base").unwrap().visuals[0];
        assert_eq!(visual.color, Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(visual.geometry, UrdfGeometry::Cylinder { radius: 0.05, length: 0.2 });
    }

    #[test]
    fn test_missing_robot_name() {
        assert!(parse_urdf_str(r#"<robot><link name="base"/></robot>"#).is_err());
    }

    #[test]
    fn test_unknown_joint_type() {
        let xml = r#"
            <robot name="r">
                <link name="a"/><link name="b"/>
                <joint name="j" type="hinge"><parent link="a"/><child link="b"/></joint>
            </robot>
        "#;
        assert!(matches!(parse_urdf_str(xml), Err(UrdfError::UnknownJointType(_))));
    }

    #[test]
    fn test_joint_without_parent() {
        let xml = r#"
            <robot name="r">
                <link name="a"/>
                <joint name="j" type="fixed"><child link="a"/></joint>
            </robot>
        "#;
        assert!(matches!(
            parse_urdf_str(xml),
            Err(UrdfError::MissingElement { element: "parent", .. })
        ));
    }

    #[test]
    fn test_bad_vector() {
        assert!(parse_vector3("1 2").is_err());
        assert!(parse_vector3("1 two 3").is_err());
        assert_eq!(parse_vector3("  1   2   3 ").unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_no_robot_element() {
        assert!(matches!(
            parse_urdf_str("<sdf/>"),
            Err(UrdfError::MissingElement { element: "robot", .. })
        ));
    }
}
