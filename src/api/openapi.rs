//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{account, join_request, ledger, member, pool, system};
use crate::custody::{ClaimKey, RefundOutcome};
use crate::domain::{
    AccountId, JoinRequestStatus, JoinRequestView, MemberSlots, PeerBinding, PeerId, PoolId,
    PoolSummary, SlotInfo,
};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`
/// when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "storage-pools",
        description = "Membership, join-request voting and collateral escrow for storage pools."
    ),
    paths(
        pool::create_pool,
        pool::list_pools,
        pool::get_pool,
        pool::delete_pool,
        pool::set_max_members,
        pool::set_required_tokens,
        join_request::submit_join_request,
        join_request::list_join_requests,
        join_request::get_join_request,
        join_request::vote,
        join_request::approve,
        join_request::cancel,
        member::list_members,
        member::member_count,
        member::add_member,
        member::get_slot,
        member::remove_member,
        member::evict_members,
        account::get_account,
        account::set_forfeiture,
        account::get_peer,
        account::get_account_claim,
        account::get_peer_claim,
        account::claim,
        account::get_custody,
        account::recover,
        ledger::approve,
        ledger::mint,
        system::health_handler,
    ),
    components(schemas(
        AccountId,
        PeerId,
        PoolId,
        PoolSummary,
        MemberSlots,
        SlotInfo,
        JoinRequestView,
        JoinRequestStatus,
        PeerBinding,
        ClaimKey,
        RefundOutcome,
        ErrorResponse,
        ErrorBody,
        dto::PaginationMeta,
        dto::CreatePoolRequest,
        dto::PoolListResponse,
        dto::SetMaxMembersRequest,
        dto::SetRequiredTokensRequest,
        dto::SubmitJoinRequest,
        dto::VoteRequest,
        dto::JoinRequestStatusResponse,
        dto::AddMemberRequest,
        dto::RemoveMemberResponse,
        dto::BatchRemoveRequest,
        dto::BatchRemoveResponse,
        dto::SlotStatusResponse,
        dto::MemberCountResponse,
        dto::AccountStatusResponse,
        dto::SetForfeitRequest,
        dto::SetForfeitResponse,
        dto::PeerStatusResponse,
        dto::ClaimRequest,
        dto::ClaimResponse,
        dto::RecoverRequest,
        dto::RecoverResponse,
        dto::CustodyResponse,
        dto::ApproveRequest,
        dto::MintRequest,
        system::HealthResponse,
    )),
    tags(
        (name = "Pools", description = "Pool lifecycle and parameters"),
        (name = "Join requests", description = "Escrowed admission and voting"),
        (name = "Members", description = "Membership slots"),
        (name = "Accounts", description = "Forfeiture and peer identity"),
        (name = "Claims", description = "Claimable ledger for failed refunds"),
        (name = "Admin", description = "Custody and emergency recovery"),
        (name = "Ledger", description = "Development token ledger"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
