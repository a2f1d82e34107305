//! Raw record types produced by the SOAP pull parsers.
//!
//! Each record mirrors one `<return>` block of a SOAP method response.
//! Fields arrive keyed by lowercased element local names; anything
//! unrecognized is ignored. Date fields stay as epoch millis here and are
//! only turned into absolute timestamps when mapped to curated rows.

use rust_decimal::Decimal;

use super::fields::{parse_decimal, parse_long, parse_xml_datetime};

/// A record type assembled field-by-field from XML child elements.
pub trait SoapRecord: Default + Send {
    /// Applies one child element. `field` is the lowercased local name and
    /// `text` is trimmed, non-empty character content.
    fn assign(&mut self, field: &str, text: &str);
}

/// One `promediosSipsaCiudad` return block.
#[derive(Debug, Clone, Default)]
pub struct CityRecord {
    pub reg_id: Option<i64>,
    pub ciudad: Option<String>,
    pub cod_producto: Option<i64>,
    pub producto: Option<String>,
    pub fecha_captura: Option<i64>,
    pub fecha_creacion: Option<i64>,
    pub precio_promedio: Option<Decimal>,
    pub enviado: Option<Decimal>,
}

impl SoapRecord for CityRecord {
    fn assign(&mut self, field: &str, text: &str) {
        match field {
            "regid" => self.reg_id = parse_long(text),
            "ciudad" => self.ciudad = Some(text.to_string()),
            "codproducto" => self.cod_producto = parse_long(text),
            "producto" => self.producto = Some(text.to_string()),
            "fechacaptura" => self.fecha_captura = parse_xml_datetime(text),
            "fechacreacion" => self.fecha_creacion = parse_xml_datetime(text),
            "preciopromedio" => self.precio_promedio = parse_decimal(text),
            "enviado" => self.enviado = parse_decimal(text),
            _ => {}
        }
    }
}

/// One `promediosSipsaParcial` return block.
///
/// `enma_fecha` keeps the raw wire text; the dedup hash is computed over
/// that original text, while the curated column gets the parsed instant.
#[derive(Debug, Clone, Default)]
pub struct PartialRecord {
    pub muni_id: Option<String>,
    pub muni_nombre: Option<String>,
    pub dept_nombre: Option<String>,
    pub fuen_id: Option<i64>,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub id_arti_semana: Option<i64>,
    pub arti_nombre: Option<String>,
    pub grup_nombre: Option<String>,
    pub enma_fecha: Option<String>,
    pub promedio_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub minimo_kg: Option<Decimal>,
}

impl SoapRecord for PartialRecord {
    fn assign(&mut self, field: &str, text: &str) {
        match field {
            "muniid" => self.muni_id = Some(text.to_string()),
            "muninombre" => self.muni_nombre = Some(text.to_string()),
            "deptnombre" => self.dept_nombre = Some(text.to_string()),
            "fuenid" => self.fuen_id = parse_long(text),
            "fuennombre" => self.fuen_nombre = Some(text.to_string()),
            "futiid" => self.futi_id = parse_long(text),
            "idartisemana" => self.id_arti_semana = parse_long(text),
            "artinombre" => self.arti_nombre = Some(text.to_string()),
            "grupnombre" => self.grup_nombre = Some(text.to_string()),
            "enmafecha" => self.enma_fecha = Some(text.to_string()),
            "promediokg" => self.promedio_kg = parse_decimal(text),
            "maximokg" => self.maximo_kg = parse_decimal(text),
            "minimokg" => self.minimo_kg = parse_decimal(text),
            _ => {}
        }
    }
}

/// One `promediosSipsaSemanaMadr` return block.
#[derive(Debug, Clone, Default)]
pub struct WeeklyRecord {
    pub tmp_mayo_sem_id: Option<i64>,
    pub arti_id: Option<i64>,
    pub arti_nombre: Option<String>,
    pub fuen_id: Option<i64>,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_ini: Option<i64>,
    pub fecha_creacion: Option<i64>,
    pub minimo_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub promedio_kg: Option<Decimal>,
    pub enviado: Option<Decimal>,
}

impl SoapRecord for WeeklyRecord {
    fn assign(&mut self, field: &str, text: &str) {
        match field {
            "tmpmayosemid" => self.tmp_mayo_sem_id = parse_long(text),
            "artiid" => self.arti_id = parse_long(text),
            "artinombre" => self.arti_nombre = Some(text.to_string()),
            "fuenid" => self.fuen_id = parse_long(text),
            "fuennombre" => self.fuen_nombre = Some(text.to_string()),
            "futiid" => self.futi_id = parse_long(text),
            "fechaini" => self.fecha_ini = parse_xml_datetime(text),
            "fechacreacion" => self.fecha_creacion = parse_xml_datetime(text),
            "minimokg" => self.minimo_kg = parse_decimal(text),
            "maximokg" => self.maximo_kg = parse_decimal(text),
            "promediokg" => self.promedio_kg = parse_decimal(text),
            "enviado" => self.enviado = parse_decimal(text),
            _ => {}
        }
    }
}

/// One `promediosSipsaMesMadr` return block.
#[derive(Debug, Clone, Default)]
pub struct MonthlyRecord {
    pub tmp_mayo_mes_id: Option<i64>,
    pub arti_id: Option<i64>,
    pub arti_nombre: Option<String>,
    pub fuen_id: Option<i64>,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_mes_ini: Option<i64>,
    pub fecha_creacion: Option<i64>,
    pub minimo_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub promedio_kg: Option<Decimal>,
    pub enviado: Option<Decimal>,
}

impl SoapRecord for MonthlyRecord {
    fn assign(&mut self, field: &str, text: &str) {
        match field {
            "tmpmayomesid" => self.tmp_mayo_mes_id = parse_long(text),
            "artiid" => self.arti_id = parse_long(text),
            "artinombre" => self.arti_nombre = Some(text.to_string()),
            "fuenid" => self.fuen_id = parse_long(text),
            "fuennombre" => self.fuen_nombre = Some(text.to_string()),
            "futiid" => self.futi_id = parse_long(text),
            "fechamesini" => self.fecha_mes_ini = parse_xml_datetime(text),
            "fechacreacion" => self.fecha_creacion = parse_xml_datetime(text),
            "minimokg" => self.minimo_kg = parse_decimal(text),
            "maximokg" => self.maximo_kg = parse_decimal(text),
            "promediokg" => self.promedio_kg = parse_decimal(text),
            "enviado" => self.enviado = parse_decimal(text),
            _ => {}
        }
    }
}

/// One `promedioAbasSipsaMesMadr` return block.
#[derive(Debug, Clone, Default)]
pub struct SupplyRecord {
    pub tmp_abas_mes_id: Option<i64>,
    pub arti_id: Option<i64>,
    pub arti_nombre: Option<String>,
    pub fuen_id: Option<i64>,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_mes: Option<i64>,
    pub fecha_creacion: Option<i64>,
    pub cantidad_ton: Option<Decimal>,
    pub enviado: Option<Decimal>,
}

impl SoapRecord for SupplyRecord {
    fn assign(&mut self, field: &str, text: &str) {
        match field {
            "tmpabasmesid" => self.tmp_abas_mes_id = parse_long(text),
            "artiid" => self.arti_id = parse_long(text),
            "artinombre" => self.arti_nombre = Some(text.to_string()),
            "fuenid" => self.fuen_id = parse_long(text),
            "fuennombre" => self.fuen_nombre = Some(text.to_string()),
            "futiid" => self.futi_id = parse_long(text),
            "fechamesini" => self.fecha_mes = parse_xml_datetime(text),
            "fechacreacion" => self.fecha_creacion = parse_xml_datetime(text),
            "cantidadton" => self.cantidad_ton = parse_decimal(text),
            "enviado" => self.enviado = parse_decimal(text),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_ignored() {
        let mut record = CityRecord::default();
        record.assign("regid", "7");
        record.assign("somethingelse", "whatever");
        assert_eq!(record.reg_id, Some(7));
    }

    #[test]
    fn bad_numeric_text_leaves_field_null() {
        let mut record = WeeklyRecord::default();
        record.assign("artiid", "not-a-number");
        assert!(record.arti_id.is_none());
    }

    #[test]
    fn partial_keeps_raw_survey_date_text() {
        let mut record = PartialRecord::default();
        record.assign("enmafecha", "2026-01-02T00:00:00Z");
        assert_eq!(record.enma_fecha.as_deref(), Some("2026-01-02T00:00:00Z"));
    }
}
