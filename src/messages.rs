//! Shared text shown to users.
//!
//! Keep all user-facing strings in this module so they stay in one place and are
//! easy to update or translate.

pub const HELP_TEXT: &str = "Genero descripciones breves de imágenes de las danzas de Paucartambo, en español y quechua.\n\n\
     <b>Cómo usarlo:</b>\n\
     • Envía una foto con un título como pie de foto.\n\
     • /describe &lt;url&gt; &lt;título&gt; - Describir una imagen desde una URL.\n\
     • /history - Ver las últimas descripciones generadas.\n\
     • /export - Descargar el historial en CSV.\n\
     • /info - Información del sistema.";

pub const DESCRIBE_USAGE: &str = "Uso: /describe <url de la imagen> <título o descripción breve>";
pub const PHOTO_NEEDS_CAPTION: &str =
    "Añade un título o descripción breve como pie de foto para generar la descripción.";

pub const TITLE_REQUIRED: &str = "Ingrese un título o descripción breve de la imagen.";
pub const IMAGE_REQUIRED: &str = "Ingrese la URL de la imagen o cargue una imagen.";

pub const SPANISH_HEADING: &str = "Descripción en español:";
pub const QUECHUA_HEADING: &str = "Descripción en quechua:";

pub const HISTORY_EMPTY: &str = "Aún no hay descripciones generadas.";
pub const HISTORY_HEADING: &str = "Historial de descripciones generadas:";
pub const EXPORT_FILE_NAME: &str = "historial.csv";

pub fn generation_failed(err: &anyhow::Error) -> String {
    format!("Error al generar la descripción: {err:#}")
}
