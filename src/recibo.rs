//! Payment receipt rendering.
//!
//! A single-pass transform from one payment plus the office profile into a
//! one-page PDF. Layout is fixed: title block, office contact block,
//! receipt number and issue date, client block, payment detail block, an
//! optional diagonal PENDIENTE watermark, a two-row summary table and an
//! optional wrapped notes block.
//!
//! Missing optional data never aborts a render; it degrades to the literal
//! placeholder "No disponible". For fixed inputs and a fixed issue date
//! the output bytes are reproducible.

use chrono::{Datelike, NaiveDate};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::models::{Despacho, Pago};

const NO_DISPONIBLE: &str = "No disponible";

// A4 geometry in points; layout constants stay in millimeters measured
// from the top of the page, converted on every draw call.
const MM: f32 = 72.0 / 25.4;
const PAGE_W: f32 = 210.0 * MM;
const PAGE_H: f32 = 297.0 * MM;
const MARGEN: f32 = 15.0;
const CONTENIDO: f32 = 210.0 - 2.0 * MARGEN;

// Palette of the printed receipt.
const PRIMARIO: (f32, f32, f32) = (0.0, 31.0 / 255.0, 63.0 / 255.0);
const SECUNDARIO: (f32, f32, f32) = (0.0, 51.0 / 255.0, 102.0 / 255.0);
const GRIS: (f32, f32, f32) = (100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0);
const NEGRO: (f32, f32, f32) = (0.0, 0.0, 0.0);
const BLANCO: (f32, f32, f32) = (1.0, 1.0, 1.0);
const ROJO_MARCA: (f32, f32, f32) = (200.0 / 255.0, 50.0 / 255.0, 50.0 / 255.0);
const ZEBRA: (f32, f32, f32) = (240.0 / 255.0, 240.0 / 255.0, 240.0 / 255.0);
const BORDE: (f32, f32, f32) = (0.65, 0.65, 0.65);

const FILA_TABLA: f32 = 8.0;

/// Everything the renderer needs about the payment, already resolved.
#[derive(Debug, Clone, Default)]
pub struct ReciboDoc {
    pub pago_id: String,
    pub cliente: String,
    /// Client email, resolved by name match against the clientes
    /// collection; `None` renders as the placeholder.
    pub email: Option<String>,
    pub caso: String,
    pub monto: f64,
    pub fecha: String,
    pub metodo: String,
    pub estado: String,
    pub comprobante: String,
    pub notas: String,
}

impl ReciboDoc {
    pub fn desde_pago(pago: &Pago, email: Option<String>) -> Self {
        Self {
            pago_id: pago.id.clone().unwrap_or_default(),
            cliente: pago.cliente.clone(),
            email,
            caso: pago.caso.clone(),
            monto: pago.monto,
            fecha: pago.fecha.clone(),
            metodo: pago.metodo.clone(),
            estado: pago.estado.clone(),
            comprobante: pago.comprobante.clone(),
            notas: pago.notas.clone(),
        }
    }
}

/// Rendered receipt: the PDF bytes plus the structural watermark flag.
#[derive(Debug, Clone)]
pub struct ReciboRender {
    pub bytes: Vec<u8>,
    pub marca_de_agua: bool,
}

/// Receipt number: payment id plus the rendering year.
pub fn numero_recibo(pago_id: &str, emitido: NaiveDate) -> String {
    format!("{}-{}", pago_id, emitido.year())
}

/// Amount with thousands separators: 2500 -> "2,500", 1234567.5 ->
/// "1,234,567.50". Whole amounts carry no decimals.
pub fn miles(valor: f64) -> String {
    let negativo = valor < 0.0;
    let redondeado = (valor.abs() * 100.0).round() / 100.0;
    let entero = redondeado.trunc() as i64;
    let centavos = ((redondeado - entero as f64) * 100.0).round() as i64;

    let digitos = entero.to_string();
    let mut agrupado = String::with_capacity(digitos.len() + digitos.len() / 3);
    for (i, ch) in digitos.chars().enumerate() {
        if i > 0 && (digitos.len() - i) % 3 == 0 {
            agrupado.push(',');
        }
        agrupado.push(ch);
    }
    if centavos > 0 {
        agrupado.push_str(&format!(".{centavos:02}"));
    }
    if negativo {
        format!("-{agrupado}")
    } else {
        agrupado
    }
}

fn envolver(texto: &str, ancho: usize) -> Vec<String> {
    let mut salida = Vec::new();
    let mut linea = String::new();
    for palabra in texto.split_whitespace() {
        if linea.is_empty() {
            linea.push_str(palabra);
            continue;
        }
        let largo = linea.chars().count() + 1 + palabra.chars().count();
        if largo > ancho.max(8) {
            salida.push(linea);
            linea = palabra.to_string();
        } else {
            linea.push(' ');
            linea.push_str(palabra);
        }
    }
    if !linea.is_empty() {
        salida.push(linea);
    }
    if salida.is_empty() {
        salida.push(String::new());
    }
    salida
}

fn o_no_disponible(valor: &str) -> &str {
    let v = valor.trim();
    if v.is_empty() {
        NO_DISPONIBLE
    } else {
        v
    }
}

/// The Helvetica variants have no embedded widths here; text placement
/// estimates half an em per character, which is close enough for the
/// fixed layout this receipt uses.
fn ancho_estimado(texto: &str, tamano: f32) -> f32 {
    texto.chars().count() as f32 * tamano * 0.5
}

/// WinAnsi (latin-1) byte encoding for the standard fonts; anything
/// outside the range renders as '?'.
fn latin1(texto: &str) -> Vec<u8> {
    texto
        .chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF {
                cp as u8
            } else {
                b'?'
            }
        })
        .collect()
}

struct Lienzo {
    content: Content,
}

impl Lienzo {
    fn new() -> Self {
        Self {
            content: Content::new(),
        }
    }

    /// y grows downward in the layout constants; PDF user space grows
    /// upward.
    fn y(desde_arriba: f32) -> f32 {
        PAGE_H - desde_arriba * MM
    }

    fn texto(
        &mut self,
        fuente: &[u8],
        tamano: f32,
        color: (f32, f32, f32),
        x_mm: f32,
        y_mm: f32,
        texto: &str,
    ) {
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.begin_text();
        self.content.set_font(Name(fuente), tamano);
        self.content
            .set_text_matrix([1.0, 0.0, 0.0, 1.0, x_mm * MM, Self::y(y_mm)]);
        self.content.show(Str(&latin1(texto)));
        self.content.end_text();
    }

    fn texto_centrado(
        &mut self,
        fuente: &[u8],
        tamano: f32,
        color: (f32, f32, f32),
        y_mm: f32,
        texto: &str,
    ) {
        let x = (PAGE_W - ancho_estimado(texto, tamano)) / 2.0;
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.begin_text();
        self.content.set_font(Name(fuente), tamano);
        self.content
            .set_text_matrix([1.0, 0.0, 0.0, 1.0, x, Self::y(y_mm)]);
        self.content.show(Str(&latin1(texto)));
        self.content.end_text();
    }

    fn linea(&mut self, x1_mm: f32, x2_mm: f32, y_mm: f32, grosor: f32, color: (f32, f32, f32)) {
        self.content.save_state();
        self.content.set_stroke_rgb(color.0, color.1, color.2);
        self.content.set_line_width(grosor);
        self.content.move_to(x1_mm * MM, Self::y(y_mm));
        self.content.line_to(x2_mm * MM, Self::y(y_mm));
        self.content.stroke();
        self.content.restore_state();
    }

    fn rectangulo_relleno(
        &mut self,
        x_mm: f32,
        y_mm: f32,
        w_mm: f32,
        h_mm: f32,
        color: (f32, f32, f32),
    ) {
        self.content.save_state();
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content
            .rect(x_mm * MM, Self::y(y_mm + h_mm), w_mm * MM, h_mm * MM);
        self.content.fill_nonzero();
        self.content.restore_state();
    }

    fn rectangulo_borde(&mut self, x_mm: f32, y_mm: f32, w_mm: f32, h_mm: f32) {
        self.content.save_state();
        self.content.set_stroke_rgb(BORDE.0, BORDE.1, BORDE.2);
        self.content
            .rect(x_mm * MM, Self::y(y_mm + h_mm), w_mm * MM, h_mm * MM);
        self.content.stroke();
        self.content.restore_state();
    }

    /// Diagonal semi-transparent overlay across the page center.
    fn marca_de_agua(&mut self, texto: &str) {
        let (seno, coseno) = 45f32.to_radians().sin_cos();
        let x = PAGE_W / 2.0 - ancho_estimado(texto, 60.0) / 2.0 * coseno;
        let y = PAGE_H / 2.0 - ancho_estimado(texto, 60.0) / 2.0 * seno;
        self.content.save_state();
        self.content.set_parameters(Name(b"GS1"));
        self.content
            .set_fill_rgb(ROJO_MARCA.0, ROJO_MARCA.1, ROJO_MARCA.2);
        self.content.begin_text();
        self.content.set_font(Name(b"F2"), 60.0);
        self.content
            .set_text_matrix([coseno, seno, -seno, coseno, x, y]);
        self.content.show(Str(&latin1(texto)));
        self.content.end_text();
        self.content.restore_state();
    }
}

/// Render the receipt. `emitido` is the issue date stamped on the page —
/// the route passes today; tests pin it.
pub fn render_pdf(doc: &ReciboDoc, despacho: &Despacho, emitido: NaiveDate) -> ReciboRender {
    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let page_id = Ref::new(3);
    let content_id = Ref::new(4);
    let fuente_id = Ref::new(5);
    let negrita_id = Ref::new(6);
    let transparencia_id = Ref::new(7);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);
    {
        let mut pages = pdf.pages(pages_id);
        pages.count(1);
        pages.kids([page_id]);
    }
    {
        let mut page = pdf.page(page_id);
        page.parent(pages_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
            .contents(content_id);
        let mut resources = page.resources();
        resources
            .fonts()
            .pair(Name(b"F1"), fuente_id)
            .pair(Name(b"F2"), negrita_id);
        resources
            .ext_g_states()
            .pair(Name(b"GS1"), transparencia_id);
    }
    pdf.type1_font(fuente_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(negrita_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.ext_graphics(transparencia_id).non_stroking_alpha(0.2);

    let mut lienzo = Lienzo::new();
    let m = MARGEN;

    // Encabezado
    lienzo.texto_centrado(b"F2", 22.0, PRIMARIO, m + 10.0, "LEGALMANAGER");
    lienzo.texto_centrado(b"F2", 16.0, PRIMARIO, m + 20.0, "Recibo de Pago");
    lienzo.linea(m, 210.0 - m, m + 25.0, 0.5 * MM, PRIMARIO);

    // Información del despacho
    lienzo.texto(b"F1", 10.0, GRIS, m, m + 35.0, o_no_disponible(&despacho.nombre));
    lienzo.texto(b"F1", 10.0, GRIS, m, m + 40.0, o_no_disponible(&despacho.direccion));
    lienzo.texto(
        b"F1",
        10.0,
        GRIS,
        m,
        m + 45.0,
        &format!("Tel: {}", o_no_disponible(&despacho.telefono)),
    );
    lienzo.texto(
        b"F1",
        10.0,
        GRIS,
        m,
        m + 50.0,
        &format!("Email: {}", o_no_disponible(&despacho.email)),
    );

    // Información del recibo
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 65.0, "RECIBO N°:");
    lienzo.texto(
        b"F1",
        12.0,
        NEGRO,
        m + 30.0,
        m + 65.0,
        &numero_recibo(&doc.pago_id, emitido),
    );
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 72.0, "FECHA DE EMISIÓN:");
    lienzo.texto(
        b"F1",
        12.0,
        NEGRO,
        m + 50.0,
        m + 72.0,
        &emitido.format("%d/%m/%Y").to_string(),
    );

    // Datos del cliente
    lienzo.texto(b"F2", 12.0, PRIMARIO, m, m + 85.0, "DATOS DEL CLIENTE");
    lienzo.linea(m, m + 60.0, m + 87.0, 0.2 * MM, PRIMARIO);
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 95.0, "Cliente:");
    lienzo.texto(b"F1", 12.0, NEGRO, m + 30.0, m + 95.0, o_no_disponible(&doc.cliente));
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 102.0, "Email:");
    lienzo.texto(
        b"F1",
        12.0,
        NEGRO,
        m + 30.0,
        m + 102.0,
        doc.email.as_deref().map(o_no_disponible).unwrap_or(NO_DISPONIBLE),
    );

    // Detalles del pago
    let concepto = format!("Servicios legales - {}", o_no_disponible(&doc.caso));
    lienzo.texto(b"F2", 12.0, PRIMARIO, m, m + 115.0, "DETALLES DEL PAGO");
    lienzo.linea(m, m + 60.0, m + 117.0, 0.2 * MM, PRIMARIO);
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 125.0, "Concepto:");
    lienzo.texto(b"F1", 12.0, NEGRO, m + 30.0, m + 125.0, &concepto);
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 132.0, "Fecha del pago:");
    lienzo.texto(b"F1", 12.0, NEGRO, m + 50.0, m + 132.0, o_no_disponible(&doc.fecha));
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 139.0, "Método de pago:");
    lienzo.texto(b"F1", 12.0, NEGRO, m + 50.0, m + 139.0, o_no_disponible(&doc.metodo));
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 146.0, "Comprobante:");
    lienzo.texto(
        b"F1",
        12.0,
        NEGRO,
        m + 50.0,
        m + 146.0,
        o_no_disponible(&doc.comprobante),
    );
    lienzo.texto(b"F1", 12.0, SECUNDARIO, m, m + 153.0, "Estado:");
    lienzo.texto(b"F1", 12.0, NEGRO, m + 30.0, m + 153.0, o_no_disponible(&doc.estado));

    // Marca de agua sólo para pagos aún no cobrados.
    let marca = doc.estado.trim() == "Pendiente";
    if marca {
        lienzo.marca_de_agua("PENDIENTE");
    }

    // Resumen
    lienzo.texto(b"F2", 12.0, PRIMARIO, m, m + 170.0, "RESUMEN");
    lienzo.linea(m, m + 30.0, m + 172.0, 0.2 * MM, PRIMARIO);

    let monto = format!("${}", miles(doc.monto));
    let col1 = CONTENIDO * 0.72;
    let col2 = CONTENIDO - col1;
    let tabla = m + 175.0;

    // Encabezado de tabla
    lienzo.rectangulo_relleno(m, tabla, CONTENIDO, FILA_TABLA, PRIMARIO);
    lienzo.texto(b"F2", 11.0, BLANCO, m + 2.0, tabla + 5.5, "Descripción");
    lienzo.texto(b"F2", 11.0, BLANCO, m + col1 + 2.0, tabla + 5.5, "Monto");

    // Filas: partida única y TOTAL por el mismo monto.
    let filas = [(concepto.as_str(), false), ("TOTAL", true)];
    for (i, (etiqueta, total)) in filas.iter().enumerate() {
        let y = tabla + FILA_TABLA * (i as f32 + 1.0);
        if i % 2 == 1 {
            lienzo.rectangulo_relleno(m, y, CONTENIDO, FILA_TABLA, ZEBRA);
        }
        let fuente: &[u8] = if *total { b"F2" } else { b"F1" };
        lienzo.texto(fuente, 11.0, NEGRO, m + 2.0, y + 5.5, etiqueta);
        lienzo.texto(fuente, 11.0, NEGRO, m + col1 + 2.0, y + 5.5, &monto);
        lienzo.rectangulo_borde(m, y, col1, FILA_TABLA);
        lienzo.rectangulo_borde(m + col1, y, col2, FILA_TABLA);
    }
    lienzo.rectangulo_borde(m, tabla, col1, FILA_TABLA);
    lienzo.rectangulo_borde(m + col1, tabla, col2, FILA_TABLA);
    let fin_tabla = tabla + FILA_TABLA * 3.0;

    // Notas — omitido por completo cuando el pago no trae notas.
    if !doc.notas.trim().is_empty() {
        lienzo.texto(b"F2", 12.0, PRIMARIO, m, fin_tabla + 15.0, "NOTAS");
        lienzo.linea(m, m + 20.0, fin_tabla + 17.0, 0.2 * MM, PRIMARIO);
        let ancho = (CONTENIDO * MM / (10.0 * 0.5)) as usize;
        for (i, renglon) in envolver(doc.notas.trim(), ancho).iter().enumerate() {
            lienzo.texto(
                b"F1",
                10.0,
                NEGRO,
                m,
                fin_tabla + 25.0 + i as f32 * 5.0,
                renglon,
            );
        }
    }

    // Pie de página
    lienzo.texto_centrado(
        b"F1",
        10.0,
        GRIS,
        297.0 - 30.0,
        "Este documento es un comprobante de pago válido.",
    );
    lienzo.texto_centrado(
        b"F1",
        10.0,
        GRIS,
        297.0 - 25.0,
        "Gracias por confiar en nuestros servicios legales.",
    );
    lienzo.texto_centrado(b"F1", 10.0, PRIMARIO, 297.0 - 20.0, "LegalManager © 2025");

    pdf.stream(content_id, &lienzo.content.finish());

    ReciboRender {
        bytes: pdf.finish(),
        marca_de_agua: marca,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
