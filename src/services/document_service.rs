// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::QrCode;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DeviationRepository,
    models::deviations::{ActionStatus, Approval, Deviation},
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    deviation_repo: DeviationRepository,
    fonts_dir: String,
}

fn render_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("document rendering failed: {}", e))
}

/// PNG of a QR code carrying `payload`.
pub fn render_qr_png(payload: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(payload.as_bytes()).map_err(render_error)?;
    let image_buffer = code
        .render::<Luma<u8>>()
        .min_dimensions(320, 320)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image_buffer)
        .write_to(&mut png, ImageOutputFormat::Png)
        .map_err(render_error)?;
    Ok(png)
}

fn approval_cells(approval: &Option<Approval>) -> (String, String, String) {
    match approval {
        Some(a) => (
            if a.approved { "approved".into() } else { "rejected".into() },
            format!("{} {}", a.by, a.at.format("%Y-%m-%d %H:%M")),
            a.reason.clone().unwrap_or_default(),
        ),
        None => ("pending".into(), String::new(), String::new()),
    }
}

impl DocumentService {
    pub fn new(deviation_repo: DeviationRepository, fonts_dir: String) -> Self {
        Self { deviation_repo, fonts_dir }
    }

    /// Returns the internal id (used as file name) and the PDF bytes.
    pub async fn deviation_pdf<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(String, Vec<u8>), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = self
            .deviation_repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("deviation".into()))?
            .with_effective_status(chrono::Utc::now().date_naive());

        let pdf = self.render_deviation(&deviation)?;
        Ok((deviation.internal_id, pdf))
    }

    fn render_deviation(&self, d: &Deviation) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(format!("{} in {}", FONT_FAMILY, self.fonts_dir)))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Deviation {}", d.internal_id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let bold = style::Style::new().bold();

        doc.push(elements::Paragraph::new(format!("DEVIATION {}", d.internal_id)).styled(bold.with_font_size(16)));
        doc.push(elements::Paragraph::new(format!("Status: {:?}", d.status).to_lowercase()));
        doc.push(elements::Break::new(1));

        // --- header fields ---
        let mut fields = elements::TableLayout::new(vec![2, 5]);
        fields.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let rows: Vec<(&str, String)> = vec![
            ("Article", format!("{} {}", d.article_number, d.article_name)),
            ("Workplace", d.workplace.clone().unwrap_or_default()),
            ("Drawing", d.drawing_number.clone().unwrap_or_default()),
            ("Quantity", d.quantity.map(|q| q.to_string()).unwrap_or_default()),
            ("Charge", d.charge.clone().unwrap_or_default()),
            ("Area", format!("{:?}", d.area).to_lowercase()),
            ("Period", format!("{} - {}", d.period_from, d.period_to)),
            ("Customer", d.customer_number.clone().unwrap_or_default()),
            ("Customer authorization", if d.customer_authorization { "yes".into() } else { "no".into() }),
            ("Owner", d.owner.clone()),
            ("Description", d.description.clone()),
            ("Reason", d.reason.clone()),
        ];
        for (label, value) in rows {
            fields
                .row()
                .element(elements::Paragraph::new(label).styled(bold))
                .element(elements::Paragraph::new(value))
                .push()
                .map_err(render_error)?;
        }
        doc.push(fields);
        doc.push(elements::Break::new(1.5));

        // --- approvals ---
        doc.push(elements::Paragraph::new("Approvals").styled(bold.with_font_size(12)));
        let mut approvals = elements::TableLayout::new(vec![3, 2, 4, 4]);
        approvals.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        approvals
            .row()
            .element(elements::Paragraph::new("Role").styled(bold))
            .element(elements::Paragraph::new("Decision").styled(bold))
            .element(elements::Paragraph::new("By").styled(bold))
            .element(elements::Paragraph::new("Reason").styled(bold))
            .push()
            .map_err(render_error)?;
        let a = &d.approvals.0;
        for (role, approval) in [
            ("Group leader", &a.group_leader),
            ("Quality manager", &a.quality_manager),
            ("Production manager", &a.production_manager),
            ("Plant manager", &a.plant_manager),
        ] {
            let (decision, by, reason) = approval_cells(approval);
            approvals
                .row()
                .element(elements::Paragraph::new(role))
                .element(elements::Paragraph::new(decision))
                .element(elements::Paragraph::new(by))
                .element(elements::Paragraph::new(reason))
                .push()
                .map_err(render_error)?;
        }
        doc.push(approvals);

        // --- corrective actions ---
        if !d.corrective_actions.0.is_empty() {
            doc.push(elements::Break::new(1.5));
            doc.push(elements::Paragraph::new("Corrective actions").styled(bold.with_font_size(12)));
            let mut actions = elements::TableLayout::new(vec![5, 3, 2, 2]);
            actions.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
            for action in d.corrective_actions.0.iter() {
                let status = match action.status {
                    ActionStatus::Open => "open",
                    ActionStatus::Closed => "closed",
                };
                actions
                    .row()
                    .element(elements::Paragraph::new(action.description.clone()))
                    .element(elements::Paragraph::new(action.responsible.clone()))
                    .element(elements::Paragraph::new(action.deadline.to_string()))
                    .element(elements::Paragraph::new(status))
                    .push()
                    .map_err(render_error)?;
            }
            doc.push(actions);
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(render_error)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_png_has_png_signature() {
        let png = render_qr_png("A:28042|Q:240|B:PEOL29").unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn missing_approval_renders_as_pending() {
        assert_eq!(approval_cells(&None).0, "pending");
    }
}
