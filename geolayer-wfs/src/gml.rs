//! GeoJSON geometry → GML 3.1.1, the geometry encoding WFS 1.1.0 expects
//! inside transactions.

use crate::error::xml_error;
use geolayer_core::ProtocolError;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;

type Xml = Writer<Vec<u8>>;

fn encoding(msg: impl Into<String>) -> ProtocolError {
    ProtocolError::Encoding(msg.into())
}

fn open(w: &mut Xml, name: &str, srs: Option<&str>) -> Result<(), ProtocolError> {
    let mut tag = BytesStart::new(name);
    if let Some(srs) = srs {
        tag.push_attribute(("srsName", srs));
    }
    w.write_event(Event::Start(tag)).map_err(xml_error)
}

fn close(w: &mut Xml, name: &str) -> Result<(), ProtocolError> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn text(w: &mut Xml, name: &str, content: &str) -> Result<(), ProtocolError> {
    open(w, name, None)?;
    w.write_event(Event::Text(BytesText::new(content)))
        .map_err(xml_error)?;
    close(w, name)
}

fn position(value: &Value) -> Result<String, ProtocolError> {
    let coords = value
        .as_array()
        .ok_or_else(|| encoding("position is not an array"))?;
    if coords.len() < 2 {
        return Err(encoding(format!("position has {} ordinates", coords.len())));
    }
    let ordinates = coords
        .iter()
        .map(|c| {
            c.as_f64()
                .map(|n| n.to_string())
                .ok_or_else(|| encoding(format!("non-numeric ordinate {c}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ordinates.join(" "))
}

fn pos_list(value: &Value) -> Result<String, ProtocolError> {
    let positions = value
        .as_array()
        .ok_or_else(|| encoding("coordinate list is not an array"))?;
    let parts = positions
        .iter()
        .map(position)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

fn members(value: &Value) -> Result<&Vec<Value>, ProtocolError> {
    value
        .as_array()
        .ok_or_else(|| encoding("multi-geometry coordinates are not an array"))
}

fn point(w: &mut Xml, coords: &Value, srs: Option<&str>) -> Result<(), ProtocolError> {
    open(w, "gml:Point", srs)?;
    text(w, "gml:pos", &position(coords)?)?;
    close(w, "gml:Point")
}

fn line_string(w: &mut Xml, coords: &Value, srs: Option<&str>) -> Result<(), ProtocolError> {
    open(w, "gml:LineString", srs)?;
    text(w, "gml:posList", &pos_list(coords)?)?;
    close(w, "gml:LineString")
}

fn polygon(w: &mut Xml, coords: &Value, srs: Option<&str>) -> Result<(), ProtocolError> {
    let rings = members(coords)?;
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| encoding("polygon has no rings"))?;
    open(w, "gml:Polygon", srs)?;
    open(w, "gml:exterior", None)?;
    linear_ring(w, exterior)?;
    close(w, "gml:exterior")?;
    for ring in interiors {
        open(w, "gml:interior", None)?;
        linear_ring(w, ring)?;
        close(w, "gml:interior")?;
    }
    close(w, "gml:Polygon")
}

fn linear_ring(w: &mut Xml, coords: &Value) -> Result<(), ProtocolError> {
    open(w, "gml:LinearRing", None)?;
    text(w, "gml:posList", &pos_list(coords)?)?;
    close(w, "gml:LinearRing")
}

/// Write a GeoJSON geometry object as a GML 3.1.1 element.
///
/// Multi-geometries become `MultiPoint`, `MultiCurve` and `MultiSurface`;
/// only the outer element carries `srsName`.
pub(crate) fn write_geometry(
    w: &mut Xml,
    geometry: &Value,
    srs: &str,
) -> Result<(), ProtocolError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| encoding("geometry has no type"))?;
    let coords = || {
        geometry
            .get("coordinates")
            .ok_or_else(|| encoding(format!("{kind} has no coordinates")))
    };
    let srs = Some(srs);
    match kind {
        "Point" => point(w, coords()?, srs),
        "LineString" => line_string(w, coords()?, srs),
        "Polygon" => polygon(w, coords()?, srs),
        "MultiPoint" => {
            open(w, "gml:MultiPoint", srs)?;
            for p in members(coords()?)? {
                open(w, "gml:pointMember", None)?;
                point(w, p, None)?;
                close(w, "gml:pointMember")?;
            }
            close(w, "gml:MultiPoint")
        }
        "MultiLineString" => {
            open(w, "gml:MultiCurve", srs)?;
            for l in members(coords()?)? {
                open(w, "gml:curveMember", None)?;
                line_string(w, l, None)?;
                close(w, "gml:curveMember")?;
            }
            close(w, "gml:MultiCurve")
        }
        "MultiPolygon" => {
            open(w, "gml:MultiSurface", srs)?;
            for p in members(coords()?)? {
                open(w, "gml:surfaceMember", None)?;
                polygon(w, p, None)?;
                close(w, "gml:surfaceMember")?;
            }
            close(w, "gml:MultiSurface")
        }
        other => Err(encoding(format!("unsupported geometry type {other}"))),
    }
}
