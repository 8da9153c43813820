//! Static and generated parts of a PresentationML package.
//!
//! The deck uses one blank master, one blank layout and a minimal theme.
//! Relationship ids in `ppt/_rels/presentation.xml.rels` are fixed: `rId1`
//! master, `rId2` theme, `rId3` onwards the slides in order.

use std::fmt::Write;

use super::escape_xml;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const XML_HEADER: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Empty shape tree header shared by master, layout and slides.
pub(crate) const SP_TREE_START: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

/// Opening tag of a PresentationML root element with the usual namespaces.
pub(crate) fn root_open(tag: &str, extra_attrs: &str) -> String {
    format!(r#"<p:{tag} xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"{extra_attrs}>"#)
}

fn relationships(entries: &[(String, &str, String)]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 160);
    xml.push_str(XML_HEADER);
    let _ = write!(xml, r#"<Relationships xmlns="{NS_RELS}">"#);
    for (id, kind, target) in entries {
        let _ = write!(
            xml,
            r#"<Relationship Id="{id}" Type="{kind}" Target="{}"/>"#,
            escape_xml(target)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

/// `[Content_Types].xml` for `slide_count` slides.
pub(crate) fn content_types(slide_count: usize) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_HEADER);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (ext, mime) in [
        ("png", "image/png"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("webp", "image/webp"),
    ] {
        let _ = write!(xml, r#"<Default Extension="{ext}" ContentType="{mime}"/>"#);
    }
    let overrides = [
        ("/ppt/presentation.xml", "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"),
        ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
        ("/docProps/app.xml", "application/vnd.openxmlformats-officedocument.extended-properties+xml"),
    ];
    for (part, kind) in overrides {
        let _ = write!(xml, r#"<Override PartName="{part}" ContentType="{kind}"/>"#);
    }
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

/// `_rels/.rels`.
pub(crate) fn root_rels() -> String {
    relationships(&[
        (
            "rId1".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            "ppt/presentation.xml".to_string(),
        ),
        (
            "rId2".to_string(),
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml".to_string(),
        ),
        (
            "rId3".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            "docProps/app.xml".to_string(),
        ),
    ])
}

/// `ppt/presentation.xml`.
pub(crate) fn presentation(slide_count: usize, cx: i64, cy: i64) -> String {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_HEADER);
    xml.push_str(&root_open("presentation", r#" saveSubsetFonts="1""#));
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..slide_count {
            let _ = write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 3 + i);
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(xml, r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#);
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    xml
}

/// `ppt/_rels/presentation.xml.rels`.
pub(crate) fn presentation_rels(slide_count: usize) -> String {
    let mut entries = vec![
        (
            "rId1".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        ),
        (
            "rId2".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
            "theme/theme1.xml".to_string(),
        ),
    ];
    for n in 1..=slide_count {
        entries.push((
            format!("rId{}", n + 2),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide",
            format!("slides/slide{n}.xml"),
        ));
    }
    relationships(&entries)
}

/// `ppt/slides/_rels/slideN.xml.rels`: `rId1` layout, then one per image.
pub(crate) fn slide_rels(media_targets: &[String]) -> String {
    let mut entries = vec![(
        "rId1".to_string(),
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout",
        "../slideLayouts/slideLayout1.xml".to_string(),
    )];
    for (i, target) in media_targets.iter().enumerate() {
        entries.push((
            format!("rId{}", i + 2),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
            format!("../media/{target}"),
        ));
    }
    relationships(&entries)
}

/// `ppt/slideMasters/slideMaster1.xml`.
pub(crate) fn slide_master() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_HEADER);
    xml.push_str(&root_open("sldMaster", ""));
    xml.push_str("<p:cSld>");
    xml.push_str(SP_TREE_START);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

/// `ppt/slideMasters/_rels/slideMaster1.xml.rels`.
pub(crate) fn slide_master_rels() -> String {
    relationships(&[
        (
            "rId1".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout",
            "../slideLayouts/slideLayout1.xml".to_string(),
        ),
        (
            "rId2".to_string(),
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
            "../theme/theme1.xml".to_string(),
        ),
    ])
}

/// `ppt/slideLayouts/slideLayout1.xml`.
pub(crate) fn slide_layout() -> String {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_HEADER);
    xml.push_str(&root_open("sldLayout", r#" type="blank" preserve="1""#));
    xml.push_str(r#"<p:cSld name="Blank">"#);
    xml.push_str(SP_TREE_START);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

/// `ppt/slideLayouts/_rels/slideLayout1.xml.rels`.
pub(crate) fn slide_layout_rels() -> String {
    relationships(&[(
        "rId1".to_string(),
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster",
        "../slideMasters/slideMaster1.xml".to_string(),
    )])
}

/// `ppt/theme/theme1.xml`.
pub(crate) fn theme(font: &str) -> String {
    let font = escape_xml(font);
    let mut xml = String::with_capacity(3072);
    xml.push_str(XML_HEADER);
    let _ = write!(xml, r#"<a:theme xmlns:a="{NS_A}" name="Deck">"#);
    xml.push_str("<a:themeElements>");

    xml.push_str(r#"<a:clrScheme name="Deck">"#);
    xml.push_str(r#"<a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#);
    xml.push_str(r#"<a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2>"#);
    for (i, hex) in ["6366F1", "4F46E5", "10B981", "F59E0B", "EF4444", "8B5CF6"]
        .iter()
        .enumerate()
    {
        let n = i + 1;
        let _ = write!(xml, r#"<a:accent{n}><a:srgbClr val="{hex}"/></a:accent{n}>"#);
    }
    xml.push_str(r#"<a:hlink><a:srgbClr val="2563EB"/></a:hlink><a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink>"#);
    xml.push_str("</a:clrScheme>");

    let _ = write!(
        xml,
        r#"<a:fontScheme name="Deck"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#
    );

    xml.push_str(r#"<a:fmtScheme name="Deck">"#);
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for w in [6350, 12700, 19050] {
        let _ = write!(
            xml,
            r#"<a:ln w="{w}" cap="flat" cmpd="sng" algn="ctr">{solid}<a:prstDash val="solid"/></a:ln>"#
        );
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements></a:theme>");
    xml
}

/// `docProps/core.xml`.
pub(crate) fn core_properties(title: &str) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_HEADER);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#);
    let _ = write!(xml, "<dc:title>{}</dc:title>", escape_xml(title));
    xml.push_str("<dc:creator>deck-renderer</dc:creator>");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// `docProps/app.xml`.
pub(crate) fn app_properties(slide_count: usize) -> String {
    let mut xml = String::with_capacity(384);
    xml.push_str(XML_HEADER);
    let _ = write!(
        xml,
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>deck-renderer</Application><Slides>{slide_count}</Slides></Properties>"#
    );
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_lists_slides_after_master_and_theme() {
        let xml = presentation(2, 9_144_000, 5_143_500);
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId3"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId4"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="5143500"/>"#));

        let rels = presentation_rels(2);
        assert!(rels.contains(r#"Id="rId4""#));
        assert!(rels.contains("slides/slide2.xml"));
    }

    #[test]
    fn test_content_types_override_each_slide() {
        let xml = content_types(3);
        assert!(xml.contains("/ppt/slides/slide3.xml"));
        assert!(!xml.contains("/ppt/slides/slide4.xml"));
        assert!(xml.contains(r#"Extension="png""#));
    }

    #[test]
    fn test_slide_rels_number_images_after_layout() {
        let rels = slide_rels(&["image1.png".to_string()]);
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains("../media/image1.png"));
    }

    #[test]
    fn test_theme_escapes_font() {
        assert!(theme("A&B").contains(r#"typeface="A&amp;B""#));
    }
}
