//! Page-by-page walk over a target's relationship list

use async_stream::stream;
use futures::stream::Stream;
use std::pin::Pin;
use tracing::{debug, info, warn};

use crate::client::{ChainBlockClient, Cursor};
use crate::error::Result;
use crate::models::{FollowKind, TwitterUser};

/// Items produced while walking a list
#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    /// A page was fetched successfully; its members follow
    Page {
        cursor: Cursor,
        size: usize,
        total_count: Option<u64>,
    },
    Member(TwitterUser),
    /// The list endpoint is limited; polling again retries the same cursor
    RateLimited,
}

pub type MemberStream<'a> = Pin<Box<dyn Stream<Item = Result<PageItem>> + Send + 'a>>;

/// Walk every member of `target`'s list, starting from the first page
///
/// The stream ends after the last page or after yielding a non rate-limit
/// error. A rate-limit signal is yielded as [`PageItem::RateLimited`] and the
/// walk does not advance, so the consumer decides how long to wait before
/// polling again.
pub fn walk_members<'a>(
    client: &'a dyn ChainBlockClient,
    kind: FollowKind,
    target: &'a TwitterUser,
) -> MemberStream<'a> {
    Box::pin(stream! {
        let mut cursor = Cursor::start();
        let mut pages = 0usize;

        info!("Walking {} of {}", kind.list_endpoint(), target.screen_name);

        loop {
            match client.fetch_member_page(kind, target, &cursor).await {
                Ok(page) => {
                    pages += 1;
                    debug!(
                        "Page {} at cursor {}: {} members",
                        pages,
                        cursor,
                        page.members.len()
                    );

                    yield Ok(PageItem::Page {
                        cursor: cursor.clone(),
                        size: page.members.len(),
                        total_count: page.total_count,
                    });

                    for member in page.members {
                        yield Ok(PageItem::Member(member));
                    }

                    match page.next_cursor {
                        Some(next) => cursor = next,
                        None => {
                            info!("Reached end of {} after {} pages", kind.list_endpoint(), pages);
                            break;
                        }
                    }
                }
                Err(e) if e.is_rate_limit() => {
                    warn!("Rate limited at cursor {}: {}", cursor, e);
                    yield Ok(PageItem::RateLimited);
                }
                Err(e) => {
                    warn!("Error fetching page at cursor {}: {}", cursor, e);
                    yield Err(e);
                    break;
                }
            }
        }
    })
}
