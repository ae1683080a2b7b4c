//! 01: alternate contacts are registered.

use ssb_core::{codes, AlertTopic, CheckId, CheckReport, ContactType, StatusCode, Table};

use super::{alert, CheckContext};
use crate::error::Result;

pub fn run(ctx: &CheckContext) -> Result<CheckReport> {
    let mut table = Table::new(&["Contact type", "Name", "Email", "Phone"]);
    let mut code = StatusCode::Success;
    let mut detail = String::new();

    for kind in ContactType::ALL {
        match ctx.api.get_alternate_contact(kind) {
            Ok(contact) => table.push_row(vec![
                kind.as_str().into(),
                contact.name.into(),
                contact.email_address.into(),
                contact.phone_number.into(),
            ])?,
            Err(e) if e.is(codes::RESOURCE_NOT_FOUND) => {
                // Error stays sticky once any contact lookup failed outright.
                if code != StatusCode::Error {
                    code = StatusCode::Warning;
                }
                table.push_row(vec![
                    kind.as_str().into(),
                    "".into(),
                    "not registered".into(),
                    "".into(),
                ])?;
            }
            Err(e) => {
                code = StatusCode::Error;
                detail = e.message;
            }
        }
    }

    let alerts = vec![
        alert(AlertTopic::Contacts, StatusCode::Info)?,
        alert(AlertTopic::Contacts, code)?.with_detail(detail),
    ];
    Ok(CheckReport::new(CheckId::AccurateInformation, alerts, vec![table]))
}
