/// 작품 조회
pub const GET_ARTWORK: &str = "SELECT * FROM artworks WHERE id = $1";

/// 작품 조회 (행 잠금)
/// 동시 입찰은 이 잠금에서 직렬화된다.
pub const GET_ARTWORK_FOR_UPDATE: &str = "SELECT * FROM artworks WHERE id = $1 FOR UPDATE";

/// 작품 목록 조회
pub const LIST_ARTWORKS: &str = "SELECT * FROM artworks ORDER BY created_at DESC";

/// 출품
pub const INSERT_ARTWORK: &str = r#"
    INSERT INTO artworks (seller_id, title, artist_name, category, description, image_url, secret_threshold, end_date)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING *
"#;

/// 입찰 기록
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (artwork_id, bidder_id, amount, is_winning)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

/// 입찰 반영 후 작품 갱신
pub const UPDATE_ARTWORK_AFTER_BID: &str =
    "UPDATE artworks SET current_highest_bid = $2, status = $3 WHERE id = $1";

/// 입찰 단건 조회
pub const GET_BID: &str = "SELECT * FROM bids WHERE id = $1";

/// 작품 입찰 이력 조회 (생성 시각 순)
pub const LIST_ARTWORK_BIDS: &str = r#"
    SELECT * FROM bids
    WHERE artwork_id = $1
    ORDER BY created_at ASC
"#;

/// 입찰자 기준 입찰 조회
pub const LIST_BIDS_BY_BIDDER: &str = r#"
    SELECT * FROM bids
    WHERE bidder_id = $1
    ORDER BY created_at DESC
"#;

/// 작품에 낙찰 입찰이 있는지
pub const HAS_WINNING_BID: &str =
    "SELECT EXISTS (SELECT 1 FROM bids WHERE artwork_id = $1 AND is_winning)";

/// 결제 단건 조회
pub const GET_PAYMENT: &str = "SELECT * FROM payments WHERE id = $1";

/// 입찰 기준 결제 조회
pub const GET_PAYMENT_BY_BID: &str = "SELECT * FROM payments WHERE bid_id = $1";

/// 외부 참조 기준 결제 조회 (행 잠금, 콜백 멱등 처리용)
pub const GET_PAYMENT_BY_REFERENCE_FOR_UPDATE: &str =
    "SELECT * FROM payments WHERE external_reference = $1 FOR UPDATE";

/// 결제 생성 (PENDING)
pub const INSERT_PAYMENT: &str = r#"
    INSERT INTO payments (bid_id, external_reference, amount, currency)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

/// 결제 확정
pub const MARK_PAYMENT_SUCCEEDED: &str = r#"
    UPDATE payments
    SET status = 'SUCCEEDED', charge_reference = $2, failure_reason = NULL, updated_at = now()
    WHERE id = $1
    RETURNING *
"#;

/// 결제 실패 기록
pub const MARK_PAYMENT_FAILED: &str = r#"
    UPDATE payments
    SET status = 'FAILED', failure_reason = $2, updated_at = now()
    WHERE id = $1
    RETURNING *
"#;

/// 작품 상태 변경
pub const SET_ARTWORK_STATUS: &str = "UPDATE artworks SET status = $2 WHERE id = $1";

/// 낙찰 플래그 해제 (결제 실패 되돌리기)
pub const CLEAR_BID_WINNING: &str = "UPDATE bids SET is_winning = FALSE WHERE id = $1";

/// 만료된 진행 중 경매 조회 (행 잠금)
pub const LIST_EXPIRED_ACTIVE_ARTWORKS: &str = r#"
    SELECT * FROM artworks
    WHERE status = 'ACTIVE' AND end_date IS NOT NULL AND end_date < $1
    FOR UPDATE
"#;
