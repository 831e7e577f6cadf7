//! Integration tests for the scraping pipeline
//!
//! Static-mode runs go end-to-end against a wiremock server. Behaviour that
//! needs page scripts (load-more buttons, the manuals tab, popups) is driven
//! through a scripted page driver, with documents still served by wiremock.

mod support;

use catalog_sweep::config::FetchMode;
use catalog_sweep::crawler::{Coordinator, Fetcher};
use catalog_sweep::output::{RunStats, NO_DOCUMENTS_LINE, SUMMARY_FILE};
use catalog_sweep::site::MANUALS_SECTION;
use catalog_sweep::{Config, DedupMode, RunOutcome};
use std::path::Path;
use support::{
    detail_page, listing_page, test_config, tile, ClickEffect, ScriptedDriver, WINDOW,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn serve_pdf(server: &MockServer, route: &str, expected_requests: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .expect(expected_requests)
        .mount(server)
        .await;
}

fn read_summary(root: &Path, product: &str) -> String {
    std::fs::read_to_string(root.join(product).join(SUMMARY_FILE))
        .unwrap_or_else(|e| panic!("summary for {} missing: {}", product, e))
}

fn completed(outcome: RunOutcome) -> RunStats {
    match outcome {
        RunOutcome::Completed(stats) => stats,
        RunOutcome::NoProducts => panic!("expected products to be found"),
    }
}

async fn run_scripted(config: Config, driver: ScriptedDriver) -> RunStats {
    let fetcher = Fetcher::from_config(&config.fetch).unwrap();
    let mut coordinator = Coordinator::with_driver(config, Box::new(driver), fetcher).unwrap();
    completed(coordinator.run().await.unwrap())
}

async fn run_static(server: &MockServer, dedup: DedupMode, root: &Path) -> RunStats {
    let config = test_config(&server.uri(), FetchMode::Static, dedup, root);
    let mut coordinator = Coordinator::new(config).await.unwrap();
    completed(coordinator.run().await.unwrap())
}

/// Listing with three tiles where the third repeats the first URL
async fn mount_catalog(server: &MockServer) {
    serve_html(
        server,
        "/trane/parts",
        listing_page(
            &[
                tile("Compressor Contactor", "/trane/trn-1"),
                tile("Blower Motor", "/trane/trn-2"),
                tile("Contactor (duplicate)", "/trane/trn-1"),
            ],
            "",
        ),
    )
    .await;

    serve_html(
        server,
        "/trane/trn-1",
        detail_page(
            &[
                ("Manufacturer:", "Trane"),
                ("Manufacturer #:", "CTR01234"),
                ("Parts Town #:", "TRNCTR01234"),
            ],
            r#"<span data-listprice="199.5">$199.50</span>
               <a href="/m/contactor.pdf?view=1">Manual</a>
               <a href="/m/contactor.pdf?view=2">Manual (print)</a>
               <a href="/m/contactor.pdf?download=true">Manual (download)</a>"#,
        ),
    )
    .await;

    serve_html(
        server,
        "/trane/trn-2",
        detail_page(&[("Units:", "1 Each")], "<p>No documents here</p>"),
    )
    .await;
}

#[tokio::test]
async fn test_static_run_end_to_end() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    serve_pdf(&server, "/m/contactor.pdf", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::Unique, dir.path()).await;

    // Three tiles, two distinct URLs; the first name wins
    assert_eq!(stats.products_found, 2);
    assert_eq!(stats.products_processed, 2);
    assert!(!dir.path().join("Contactor (duplicate)").exists());

    let contactor = read_summary(dir.path(), "Compressor Contactor");
    assert!(contactor.contains(&format!(
        "Product Page: {}/trane/trn-1",
        server.uri()
    )));
    assert!(contactor.contains("List Price: $ 199.50"));
    assert!(contactor.contains("Manufacturer: Trane"));
    assert!(contactor.contains("Manufacturer #: CTR01234"));
    assert!(contactor.contains("Quantity Available: N/A"));
    assert!(contactor.contains("PDF MANUALS - WEB LINKS (UNIQUE)"));
    assert!(contactor.contains(&format!(
        "PDF 1: {}/m/contactor.pdf?view=1",
        server.uri()
    )));
    assert!(!contactor.contains("PDF 2:"));
    assert!(dir
        .path()
        .join("Compressor Contactor")
        .join("manual_1.pdf")
        .exists());

    let motor = read_summary(dir.path(), "Blower Motor");
    assert!(motor.ends_with(NO_DOCUMENTS_LINE));
    assert!(motor.contains("Units: 1 Each"));
    assert!(!dir.path().join("Blower Motor").join("manual_1.pdf").exists());

    assert_eq!(stats.documents_found, 1);
    assert_eq!(stats.documents_downloaded, 1);
}

#[tokio::test]
async fn test_all_mode_keeps_query_variants() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    serve_pdf(&server, "/m/contactor.pdf", 3).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::All, dir.path()).await;

    let contactor = read_summary(dir.path(), "Compressor Contactor");
    assert!(contactor.contains("PDF MANUALS - WEB LINKS (ALL)"));
    assert!(contactor.contains("PDF 3: "));
    assert_eq!(stats.documents_downloaded, 3);
    assert!(dir
        .path()
        .join("Compressor Contactor")
        .join("manual_3.pdf")
        .exists());
}

#[tokio::test]
async fn test_all_mode_keeps_exact_duplicates() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/trane/parts",
        listing_page(&[tile("Valve", "/p/valve")], ""),
    )
    .await;
    serve_html(
        &server,
        "/p/valve",
        detail_page(
            &[],
            r#"<span data-manual-name="a.pdf">Manual</span>
               <a href="/m/a.pdf">Manual</a>
               <a href="/m/a.pdf">Manual (again)</a>"#,
        ),
    )
    .await;
    serve_pdf(&server, "/modelManual/a.pdf", 1).await;
    serve_pdf(&server, "/m/a.pdf", 2).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::All, dir.path()).await;

    let summary = read_summary(dir.path(), "Valve");
    assert!(summary.contains(&format!("PDF 1: {}/modelManual/a.pdf", server.uri())));
    assert!(summary.contains(&format!("PDF 2: {}/m/a.pdf", server.uri())));
    assert!(summary.contains(&format!("PDF 3: {}/m/a.pdf", server.uri())));
    assert_eq!(stats.documents_found, 3);
    assert_eq!(stats.documents_downloaded, 3);
    assert!(dir.path().join("Valve").join("manual_3.pdf").exists());
}

#[tokio::test]
async fn test_pagination_and_max_pages() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/trane/parts",
        listing_page(
            &[tile("First", "/p/1")],
            r#"<a class="next" href="/trane/parts/page-2">Next</a>"#,
        ),
    )
    .await;
    serve_html(
        &server,
        "/trane/parts/page-2",
        listing_page(&[tile("Second", "/p/2")], ""),
    )
    .await;
    serve_html(&server, "/p/1", detail_page(&[], "")).await;
    serve_html(&server, "/p/2", detail_page(&[], "")).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::Unique, &dir.path().join("all")).await;
    assert_eq!(stats.products_found, 2);
    assert!(dir.path().join("all").join("Second").is_dir());

    let mut config = test_config(
        &server.uri(),
        FetchMode::Static,
        DedupMode::Unique,
        &dir.path().join("one"),
    );
    config.site.max_pages = Some(1);
    let mut coordinator = Coordinator::new(config).await.unwrap();
    let stats = completed(coordinator.run().await.unwrap());

    assert_eq!(stats.products_found, 1);
    assert!(dir.path().join("one").join("First").is_dir());
    assert!(!dir.path().join("one").join("Second").exists());
}

#[tokio::test]
async fn test_transient_listing_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trane/parts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve_html(
        &server,
        "/trane/parts",
        listing_page(&[tile("Widget", "/p/1")], ""),
    )
    .await;
    serve_html(&server, "/p/1", detail_page(&[("Units:", "Each")], "")).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::Unique, dir.path()).await;

    assert_eq!(stats.products_processed, 1);
    assert!(read_summary(dir.path(), "Widget").contains("Units: Each"));
}

#[tokio::test]
async fn test_missing_detail_page_still_writes_artifact() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/trane/parts",
        listing_page(&[tile("Ghost Part", "/p/gone")], ""),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let stats = run_static(&server, DedupMode::Unique, dir.path()).await;

    assert_eq!(stats.products_without_details, 1);
    let summary = read_summary(dir.path(), "Ghost Part");
    assert!(summary.contains("List Price: N/A"));
    assert!(summary.contains("California Residents: N/A"));
    assert!(summary.ends_with(NO_DOCUMENTS_LINE));
}

#[tokio::test]
async fn test_rendered_run_with_load_more_and_manuals_tab() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = format!("{}/trane/parts", base);
    let next_css = "button[class*='js-link-paging'], a[class*='next']";
    let tab_css = "a[href*='#manualsDiagrams']";

    let load_more = r#"<button class="js-link-paging">Load More</button>
                       <div class="modal"><button>Start Shopping</button></div>"#;
    let first_batch = [tile("A Widget", "/p/a"), tile("B Gadget", "/p/b")];
    let second_batch = [
        tile("A Widget", "/p/a"),
        tile("B Gadget", "/p/b"),
        tile("C Sprocket", "/p/c"),
    ];

    let tab = r##"<ul><li role="tab"><a href="#manualsDiagrams">Manuals &amp; Diagrams</a></li></ul>"##;
    let detail_a = detail_page(&[("Manufacturer:", "Trane")], tab);
    let detail_a_opened = detail_page(
        &[("Manufacturer:", "Trane")],
        &format!(
            r#"{}<div id="manualsDiagrams">
                 <a href="/m/a-install.pdf">Installation</a>
                 <a href="/m/a-install.pdf?rev=2">Installation (rev 2)</a>
               </div>"#,
            tab
        ),
    );
    let detail_c = detail_page(
        &[("Fits Models:", r##"<a href="#models" title="TUD080, TUD100">View Models List</a>"##)],
        r#"<span data-manual-name="c-wiring.pdf">Wiring</span>
           <div class="data-sheet__popup"><a href="/m/c-parts.pdf">Parts list</a></div>
           <p><b>California Residents:</b> WARNING: Cancer and Reproductive Harm</p>"#,
    );

    let driver = ScriptedDriver::new()
        .page(&listing, &listing_page(&first_batch, load_more))
        .on_click(
            &listing,
            next_css,
            ClickEffect::Replace(listing_page(&second_batch, load_more)),
        )
        .on_click(
            &listing,
            next_css,
            ClickEffect::Fail("element click intercepted".to_string()),
        )
        .page(&format!("{}/p/a", base), &detail_a)
        .on_click(
            &format!("{}/p/a", base),
            tab_css,
            ClickEffect::Replace(detail_a_opened),
        )
        .page(&format!("{}/p/c", base), &detail_c);

    serve_pdf(&server, "/m/a-install.pdf", 1).await;
    serve_pdf(&server, "/modelManual/c-wiring.pdf", 1).await;
    serve_pdf(&server, "/m/c-parts.pdf", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, FetchMode::Browser, DedupMode::Unique, dir.path());
    let stats = run_scripted(config, driver).await;

    // Load More worked once, then the control failed and traversal stopped
    assert_eq!(stats.products_found, 3);
    assert_eq!(stats.products_processed, 3);

    let a = read_summary(dir.path(), "A Widget");
    assert!(a.contains(&format!("PDF 1: {}/m/a-install.pdf", base)));
    assert!(!a.contains("PDF 2:"));

    // Detail page B is not served: empty but present
    let b = read_summary(dir.path(), "B Gadget");
    assert!(b.contains("Manufacturer: N/A"));
    assert!(b.ends_with(NO_DOCUMENTS_LINE));

    let c = read_summary(dir.path(), "C Sprocket");
    assert!(c.contains("Fits Models: TUD080, TUD100"));
    assert!(c.contains("California Residents: WARNING: Cancer and Reproductive Harm"));
    assert!(c.contains(&format!("PDF 1: {}/modelManual/c-wiring.pdf", base)));
    assert!(c.contains(&format!("PDF 2: {}/m/c-parts.pdf", base)));
    assert!(dir.path().join("C Sprocket").join("manual_2.pdf").exists());

    assert_eq!(stats.documents_found, 3);
    assert_eq!(stats.documents_downloaded, 3);
    assert_eq!(stats.download_failures, 0);
}

#[tokio::test]
async fn test_scrolling_reveals_documents_despite_stuck_popup() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = format!("{}/trane/parts", base);
    let detail = format!("{}/p/s", base);

    let tab = r##"<ul><li role="tab"><a href="#manualsDiagrams">Manuals &amp; Diagrams</a></li></ul>
                  <div class="modal"><button>Start Shopping</button></div>
                  <a href="/m/base.pdf">Spec sheet</a>"##;
    let page = |section: &str, footer: &str| {
        detail_page(
            &[("Units:", "Each")],
            &format!(
                r#"{}<div id="manualsDiagrams">{}</div><footer>{}</footer>"#,
                tab, section, footer
            ),
        )
    };
    let tab_pdf = r#"<a href="/m/tab.pdf">Installation</a>"#;
    let lazy_pdf = r#"<a href="/m/lazy.pdf">Wiring</a>"#;
    let footer_pdf = r#"<a href="/m/footer.pdf">Warranty</a>"#;
    let opened = page(tab_pdf, "");
    let section_scrolled = page(&format!("{}{}", tab_pdf, lazy_pdf), "");
    let page_scrolled = page(&format!("{}{}", tab_pdf, lazy_pdf), footer_pdf);

    let driver = ScriptedDriver::new()
        .page(&listing, &listing_page(&[tile("Scroll Part", "/p/s")], ""))
        .page(&detail, &page("", ""))
        .on_click(
            &detail,
            "button, a",
            ClickEffect::Fail("element click intercepted".to_string()),
        )
        .on_click(
            &detail,
            "a[href*='#manualsDiagrams']",
            ClickEffect::Replace(opened),
        )
        .on_scroll(&detail, MANUALS_SECTION, &section_scrolled)
        .on_scroll(&detail, WINDOW, &page_scrolled);

    for pdf in ["/m/base.pdf", "/m/tab.pdf", "/m/lazy.pdf", "/m/footer.pdf"] {
        serve_pdf(&server, pdf, 1).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, FetchMode::Browser, DedupMode::All, dir.path());
    let stats = run_scripted(config, driver).await;

    // The popup refused its click; the page was still scraped
    assert_eq!(stats.products_processed, 1);

    let summary = read_summary(dir.path(), "Scroll Part");
    assert!(summary.contains("Units: Each"));
    assert!(summary.contains(&format!("PDF 1: {}/m/base.pdf", base)));
    assert!(summary.contains(&format!("PDF 2: {}/m/tab.pdf", base)));
    assert!(summary.contains(&format!("PDF 3: {}/m/lazy.pdf", base)));
    assert!(summary.contains(&format!("PDF 4: {}/m/footer.pdf", base)));
    // Rescans only add what scrolling revealed
    assert!(!summary.contains("PDF 5:"));
    assert_eq!(stats.documents_downloaded, 4);
}

#[tokio::test]
async fn test_links_resolve_against_page_opened_by_click() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = format!("{}/trane/parts", base);
    let second_page = format!("{}/catalog/page-2/", base);
    let load_more = r#"<button class="js-link-paging">Load More</button>"#;

    let driver = ScriptedDriver::new()
        .page(&listing, &listing_page(&[tile("First", "/p/1")], load_more))
        .page(&second_page, &listing_page(&[tile("Second", "item-2")], ""))
        .on_click(
            &listing,
            "button[class*='js-link-paging'], a[class*='next']",
            ClickEffect::Follow(second_page.clone()),
        )
        .page(&format!("{}/p/1", base), &detail_page(&[], ""))
        .page(
            &format!("{}item-2", second_page),
            &detail_page(&[("Units:", "Pair")], ""),
        );

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, FetchMode::Browser, DedupMode::Unique, dir.path());
    let stats = run_scripted(config, driver).await;

    assert_eq!(stats.products_found, 2);
    let second = read_summary(dir.path(), "Second");
    assert!(second.contains(&format!("Product Page: {}/catalog/page-2/item-2", base)));
    assert!(second.contains("Units: Pair"));
}
