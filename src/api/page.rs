//! The single-page form and history table.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::messages::{HISTORY_HEADING, QUECHUA_HEADING, SPANISH_HEADING};
use crate::store::DescriptionRecord;

pub const PAGE_TITLE: &str =
    "Generador de Descripciones de Imágenes de Danzas de Paucartambo en Español y Quechua";

/// Result of the last form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Generated(DescriptionRecord),
    Failed(String),
}

pub fn render(records: &[DescriptionRecord], outcome: Option<&Outcome>) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n",
        title = encode_text(PAGE_TITLE)
    );

    html.push_str(
        "<form method=\"post\" action=\"/describe\" enctype=\"multipart/form-data\">\n\
         <p><label>Ingrese la URL de la imagen <input type=\"url\" name=\"image_url\"></label></p>\n\
         <p><label>O cargue una imagen <input type=\"file\" name=\"image_file\" accept=\".jpg,.jpeg,.png\"></label></p>\n\
         <p><label>Ingrese un título o descripción breve de la imagen <input type=\"text\" name=\"title\" required></label></p>\n\
         <p><button type=\"submit\">Generar Descripción</button></p>\n\
         </form>\n",
    );

    match outcome {
        Some(Outcome::Generated(record)) => html.push_str(&render_generated(record)),
        Some(Outcome::Failed(message)) => html.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            encode_text(message)
        )),
        None => {}
    }

    html.push_str(&render_table(records));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_generated(record: &DescriptionRecord) -> String {
    let mut html = String::from("<section class=\"result\">\n");
    if record.image.starts_with("http://") || record.image.starts_with("https://") {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" style=\"max-width:100%\">\n",
            encode_double_quoted_attribute(&record.image),
            encode_double_quoted_attribute(&record.title)
        ));
    }
    html.push_str(&format!(
        "<h2>{}</h2>\n<p>{}</p>\n",
        encode_text(SPANISH_HEADING),
        encode_text(&record.description)
    ));
    if let Some(quechua) = record.description_quechua.as_deref() {
        html.push_str(&format!(
            "<h2>{}</h2>\n<p>{}</p>\n",
            encode_text(QUECHUA_HEADING),
            encode_text(quechua)
        ));
    }
    html.push_str("</section>\n");
    html
}

fn render_table(records: &[DescriptionRecord]) -> String {
    let mut html = format!(
        "<h2>{}</h2>\n<p><a href=\"/api/history.csv\">Descargar CSV</a></p>\n<table>\n\
         <tr><th>imagen</th><th>descripcion</th><th>generated_description</th>\
         <th>generated_description_quechua</th><th>fecha</th></tr>\n",
        encode_text(HISTORY_HEADING)
    );
    for record in records {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(&record.image),
            encode_text(&record.title),
            encode_text(&record.description),
            encode_text(record.description_quechua.as_deref().unwrap_or("")),
            record
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        ));
    }
    html.push_str("</table>\n");
    html
}
