use std::net::IpAddr;

const TITLE: &str = "scanback";

/// Acknowledgement page returned once an address is queued.
pub fn queued_page(target: IpAddr) -> String {
    page(&format!("Added {target} to queue"))
}

fn page(heading: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>{TITLE}</title></head>\n\
         <body><h1>{heading}</h1></body>\n\
         </html>\n"
    )
}
