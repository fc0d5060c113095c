use std::fmt::Write;
use shared::types::{ServerRecord, Totals};
use crate::view::filter::View;
use crate::view::format::{
    address, constant_width, escape_html, hover_list, hover_string, humanize, millis, tooltip,
};

const NAME_BUDGET: usize = 25;
const DESCRIPTION_BUDGET: usize = 50;

/// Column headers, in column order. Consumers that scrape the table rely on these.
pub const HEADERS: [&str; 8] = [
    "Address[:Port]",
    "Players / Max<br/>Average / Top",
    "Version, Subgame[, Mapgen]",
    "Name",
    "Description",
    "Flags",
    "Uptime, Age",
    "Ping, Lag",
];

/// Render a view into the markup that replaces the mount's contents.
pub fn render(view: &View) -> String {
    let mut html = String::with_capacity(512 + view.records.len() * 1024);

    summary(&mut html, view.total, view.total_max);

    html.push_str("<table><thead><tr>");
    for header in HEADERS {
        let _ = write!(html, "<th>{}</th>", header);
    }
    html.push_str("</tr></thead><tbody>");

    let mut emitted = 0usize;
    for record in &view.records {
        if view.limit.is_some_and(|limit| emitted >= limit) {
            break;
        }
        if view.min_clients.is_some_and(|min| record.clients < min) {
            continue;
        }
        row(&mut html, record);
        emitted += 1;
    }

    html.push_str("</tbody></table>");
    html
}

fn summary(html: &mut String, total: Totals, total_max: Option<Totals>) {
    let (max_clients, max_servers) = match total_max {
        Some(max) => (max.clients.to_string(), max.servers.to_string()),
        None => ("?".to_string(), "?".to_string()),
    };
    let _ = write!(
        html,
        r#"<div class="total">Players: {}/{}&nbsp;Servers: {}/{}</div>"#,
        total.clients, max_clients, total.servers, max_servers
    );
}

fn row(html: &mut String, server: &ServerRecord) {
    html.push_str("<tr>");

    let _ = write!(html, r#"<td class="address">{}</td>"#, address(server));

    let _ = write!(
        html,
        r#"<td class="clients{}">{}{}{}</td>"#,
        hover_class(&server.clients_list),
        constant_width(&format!("{}/{}", server.clients, server.clients_max), 3.4),
        constant_width(
            &format!("{}/{}", server.pop_v.floor() as i64, server.clients_top),
            3.4
        ),
        hover_list("Clients", &server.clients_list),
    );

    let _ = write!(
        html,
        r#"<td class="version{}">{}, {}"#,
        hover_class(&server.mods),
        escape_html(&server.version),
        escape_html(&server.gameid),
    );
    if let Some(mapgen) = &server.mapgen {
        let _ = write!(html, ", {}", escape_html(mapgen));
    }
    let _ = write!(html, "{}</td>", hover_list("Mods", &server.mods));

    let _ = write!(
        html,
        r#"<td class="name"><a href="{}">{}</a></td>"#,
        escape_html(server.url.as_deref().unwrap_or_default()),
        tooltip(&server.name, NAME_BUDGET),
    );

    let _ = write!(
        html,
        r#"<td class="description">{}</td>"#,
        tooltip(&server.description, DESCRIPTION_BUDGET)
    );

    let _ = write!(
        html,
        r#"<td class="flags">{}{}</td>"#,
        hover_string("Privs", server.privileges.as_deref()),
        flags(server).join(" "),
    );

    let _ = write!(
        html,
        r#"<td class="uptime">{}/{}</td>"#,
        constant_width(&humanize(server.uptime), 3.2),
        constant_width(&humanize(server.game_time), 3.2),
    );

    let _ = write!(
        html,
        r#"<td class="ping">{}/{}</td>"#,
        constant_width(&millis(server.ping), 1.8),
        constant_width(&millis(server.lag), 1.8),
    );

    html.push_str("</tr>");
}

fn hover_class(items: &[String]) -> &'static str {
    if items.is_empty() {
        ""
    } else {
        " mts_hover_list_text"
    }
}

fn flags(server: &ServerRecord) -> Vec<&'static str> {
    [
        (server.creative, "Cre"),
        (server.damage, "Dmg"),
        (server.pvp, "Pvp"),
        (server.password, "Pwd"),
        (server.rollback, "Rol"),
        (server.can_see_far_names, "Far"),
    ]
    .into_iter()
    .filter_map(|(set, abbreviation)| set.then_some(abbreviation))
    .collect()
}
