//! Offer requests: accept, receive, finish, set_actions, destroy.
//!
//! Offers are looked up per requesting client; an id that is unknown or
//! belongs to someone else is a protocol error.

use sel_core::offer::negotiation::choose_action;
use sel_core::ports::TransferSink;
use sel_core::{ClientId, DataOffer, MimeType, OfferId, ProtocolError, Serial, SourceId, WireEvent};
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, info_span};

use crate::context::SelectionContext;
use crate::transfer::Transfer;

fn offer_mut<'a>(
    ctx: &'a mut SelectionContext,
    client: &ClientId,
    offer: &OfferId,
) -> Result<&'a mut DataOffer, ProtocolError> {
    ctx.offers
        .get_mut(offer)
        .filter(|found| found.client() == client)
        .ok_or_else(|| ProtocolError::unknown("offer", offer))
}

/// Record the destination's tentative mimetype. Drag-and-drop sources are
/// told about it.
pub fn accept(
    ctx: &mut SelectionContext,
    client: &ClientId,
    offer_id: &OfferId,
    serial: Serial,
    mime_type: Option<MimeType>,
) -> Result<(), ProtocolError> {
    let offer = offer_mut(ctx, client, offer_id)?;
    debug!(offer = %offer_id, %serial, mime = ?mime_type, "offer accept");
    offer.accept(mime_type.clone());
    if !offer.is_dnd() {
        return Ok(());
    }
    let source = offer.source().cloned();
    if let Some(source) = source.and_then(|id| ctx.sources.get_mut(&id)) {
        source.target(mime_type);
    }
    Ok(())
}

/// Start an uncapped transfer into `sink`.
///
/// Selection offers read whoever owns the class right now; drag-and-drop
/// offers read their own source. A neutralized offer only closes the sink.
pub fn receive(
    ctx: &mut SelectionContext,
    client: &ClientId,
    offer_id: &OfferId,
    mime_type: MimeType,
    sink: TransferSink,
) -> Result<JoinHandle<Result<u64, sel_core::TransferError>>, ProtocolError> {
    let offer = offer_mut(ctx, client, offer_id)?.clone();
    let span = info_span!(
        "selection.offer.receive",
        %client,
        offer = %offer_id,
        class = %offer.class(),
        mime = %mime_type,
    );

    let transfer = if offer.is_neutralized() {
        debug!(offer = %offer_id, "receive on a neutralized offer");
        Transfer::unavailable(ctx, sink)
    } else if offer.is_dnd() {
        Transfer::from_source(ctx, offer.source(), mime_type, None, sink)
    } else {
        Transfer::for_selection(ctx, offer.class(), mime_type, None, sink)
    };
    Ok(ctx.transfers.spawn(transfer, span))
}

/// Destination signals a successful drop.
pub fn finish(
    ctx: &mut SelectionContext,
    client: &ClientId,
    offer_id: &OfferId,
) -> Result<(), ProtocolError> {
    let offer = offer_mut(ctx, client, offer_id)?;
    if !offer.is_dnd() {
        return Err(ProtocolError::NotDragAndDrop);
    }
    offer.finish()?;
    let source = offer.source().cloned();
    if let Some(source) = source.and_then(|id| ctx.sources.get_mut(&id)) {
        source.notify_finish();
    }
    Ok(())
}

pub fn set_actions(
    ctx: &mut SelectionContext,
    client: &ClientId,
    offer_id: &OfferId,
    supported: u32,
    preferred: u32,
) -> Result<(), ProtocolError> {
    offer_mut(ctx, client, offer_id)?.set_actions(supported, preferred)?;
    renegotiate(ctx, offer_id);
    Ok(())
}

/// Destroying an offer that was dropped on but never finished cancels its
/// source.
pub fn destroy(
    ctx: &mut SelectionContext,
    client: &ClientId,
    offer_id: &OfferId,
) -> Result<(), ProtocolError> {
    offer_mut(ctx, client, offer_id)?;
    if let Some(offer) = ctx.offers.remove(offer_id) {
        abandon(ctx, &offer);
    }
    Ok(())
}

/// Cancel the source of an offer that goes away mid-drop.
pub fn abandon(ctx: &mut SelectionContext, offer: &DataOffer) {
    if !offer.abandons_drop() {
        return;
    }
    if let Some(source) = offer.source().and_then(|id| ctx.sources.get_mut(id)) {
        debug!(offer = %offer.id(), source = %source.id(), "dropped offer destroyed before finish");
        source.cancel();
    }
}

/// Recompute the action of one drag-and-drop offer and push it where it
/// changed. Nothing is pushed while the source is in-ask.
pub fn renegotiate(ctx: &mut SelectionContext, offer_id: &OfferId) {
    let Some(offer) = ctx.offers.get(offer_id) else {
        return;
    };
    let Some(source) = offer.source().and_then(|id| ctx.sources.get(id)) else {
        return;
    };
    let action = choose_action(
        source.actions(),
        offer.actions(),
        offer.preferred_action(),
        source.user_action(),
    );
    let source_id = source.id().clone();
    let in_ask = source.in_ask();
    let client = offer.client().clone();

    let _guard =
        debug_span!("selection.offer.negotiate", offer = %offer_id, ?action, in_ask).entered();
    if let Some(offer) = ctx.offers.get_mut(offer_id).filter(|_| !in_ask) {
        if offer.record_action(action) {
            ctx.ports.events.send(
                &client,
                WireEvent::Action {
                    offer: offer_id.clone(),
                    action,
                },
            );
        }
    }
    if let Some(source) = ctx.sources.get_mut(&source_id) {
        source.set_current_action(action);
    }
}

/// Renegotiate every outstanding offer of `source`.
pub fn renegotiate_source(ctx: &mut SelectionContext, source: &SourceId) {
    for offer in ctx.offers.offers_for_source(source) {
        renegotiate(ctx, &offer);
    }
}
