//! `inspect`: what the engine sees in a page fixture, without clicking.

use std::path::Path;

use meet_recorder_core::confirm::{assess_panel, PanelReadiness};
use meet_recorder_core::detector::{assess_join, infer_host, is_ad_hoc_meeting};
use meet_recorder_core::labels::composite_label;
use meet_recorder_core::locator::find_toolbar_control;
use meet_recorder_core::query::catalog;
use meet_recorder_core::{FixturePage, Page, Result};

pub fn run(fixture: &Path) -> Result<()> {
    let page = FixturePage::load(fixture)?;
    let doc = page.document();
    let url = page.url();

    println!("url:      {}", url);
    println!("join:     {:?}", assess_join(doc));
    println!(
        "host:     {}",
        infer_host(doc, url).map(|signal| signal.as_str()).unwrap_or("none")
    );
    println!("ad hoc:   {}", is_ad_hoc_meeting(doc, url));
    match find_toolbar_control(doc) {
        Some(control) => println!(
            "toolbar:  {} ({:?})",
            describe(&page, control.node),
            control.kind
        ),
        None => println!("toolbar:  none"),
    }
    match assess_panel(doc) {
        PanelReadiness::Ready { panel, start } => println!(
            "panel:    ready ({} / {})",
            describe(&page, panel),
            describe(&page, start)
        ),
        PanelReadiness::NotReady => println!("panel:    not ready"),
    }

    println!();
    for query in catalog::all() {
        let matches = query.resolve_all(doc, doc.root());
        println!("{:<28} {}", query.target, matches.len());
        for node in matches {
            println!(
                "    {:<20} {:?}",
                describe(&page, node),
                composite_label(doc, node)
            );
        }
    }
    Ok(())
}

fn describe(page: &FixturePage, node: meet_recorder_core::NodeId) -> String {
    match page.key_of(node) {
        Some(key) => format!("#{}", key),
        None => format!("<{}>@{}", page.document().tag(node), node.index()),
    }
}
